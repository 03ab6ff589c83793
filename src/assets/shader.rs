//! Shader programs and the schema they are drawn against.
//!
//! A [`Schema`] names every attribute buffer, uniform and texture slot a
//! program consumes, along with its type. Declaring the schema up front lets
//! the device resolve locations once at creation and lets the dispatcher pair
//! submitted resources with slots without inspecting shader source.

use std::fmt;

use crate::errors::{Error, Result};
use crate::math::prelude::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};
use crate::utils::hash_value::HashValue;
use crate::utils::prelude::{Color, FastHashSet};
use crate::{MAX_TEXTURE_SLOTS, MAX_UNIFORM_VARIABLES, MAX_VERTEX_ATTRIBUTES};

impl_handle!(ShaderHandle);

/// The two programmable stages of a program.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Primitive assembly of the index stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum DrawMode {
    Triangles,
    Lines,
}

impl Default for DrawMode {
    fn default() -> Self {
        DrawMode::Triangles
    }
}

impl DrawMode {
    /// Number of primitives assembled from `indices` indices.
    pub fn assemble(self, indices: u32) -> u32 {
        match self {
            DrawMode::Triangles => indices / 3,
            DrawMode::Lines => indices / 2,
        }
    }
}

/// Data types a schema slot can declare.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum SchemaType {
    I32,
    F32,
    Vector2f,
    Vector3f,
    Vector4f,
    Matrix2f,
    Matrix3f,
    Matrix4f,
    Texture2D,
    TextureCube,
}

impl SchemaType {
    /// Per-vertex float count when this type backs an attribute buffer.
    /// `None` for types that are not legal in buffers.
    pub fn components(self) -> Option<u8> {
        match self {
            SchemaType::F32 => Some(1),
            SchemaType::Vector2f => Some(2),
            SchemaType::Vector3f => Some(3),
            SchemaType::Vector4f => Some(4),
            _ => None,
        }
    }

    pub fn is_sampler(self) -> bool {
        match self {
            SchemaType::Texture2D | SchemaType::TextureCube => true,
            _ => false,
        }
    }
}

/// A uniform value ready for upload. Matrices are column major.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum UniformValue {
    I32(i32),
    F32(f32),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    Matrix2f([[f32; 2]; 2]),
    Matrix3f([[f32; 3]; 3]),
    Matrix4f([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn schema_type(&self) -> SchemaType {
        match *self {
            UniformValue::I32(_) => SchemaType::I32,
            UniformValue::F32(_) => SchemaType::F32,
            UniformValue::Vector2f(_) => SchemaType::Vector2f,
            UniformValue::Vector3f(_) => SchemaType::Vector3f,
            UniformValue::Vector4f(_) => SchemaType::Vector4f,
            UniformValue::Matrix2f(_) => SchemaType::Matrix2f,
            UniformValue::Matrix3f(_) => SchemaType::Matrix3f,
            UniformValue::Matrix4f(_) => SchemaType::Matrix4f,
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::I32(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vector2f(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vector3f(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vector4f(v)
    }
}

impl From<[[f32; 2]; 2]> for UniformValue {
    fn from(v: [[f32; 2]; 2]) -> Self {
        UniformValue::Matrix2f(v)
    }
}

impl From<[[f32; 3]; 3]> for UniformValue {
    fn from(v: [[f32; 3]; 3]) -> Self {
        UniformValue::Matrix3f(v)
    }
}

impl From<[[f32; 4]; 4]> for UniformValue {
    fn from(v: [[f32; 4]; 4]) -> Self {
        UniformValue::Matrix4f(v)
    }
}

impl From<Vector2<f32>> for UniformValue {
    fn from(v: Vector2<f32>) -> Self {
        UniformValue::Vector2f(*v.as_ref())
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(v: Vector3<f32>) -> Self {
        UniformValue::Vector3f(*v.as_ref())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(v: Vector4<f32>) -> Self {
        UniformValue::Vector4f(*v.as_ref())
    }
}

impl From<Matrix2<f32>> for UniformValue {
    fn from(v: Matrix2<f32>) -> Self {
        UniformValue::Matrix2f(*v.as_ref())
    }
}

impl From<Matrix3<f32>> for UniformValue {
    fn from(v: Matrix3<f32>) -> Self {
        UniformValue::Matrix3f(*v.as_ref())
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(v: Matrix4<f32>) -> Self {
        UniformValue::Matrix4f(*v.as_ref())
    }
}

impl From<Color> for UniformValue {
    fn from(v: Color) -> Self {
        UniformValue::Vector4f(v.into())
    }
}

/// One attribute buffer slot of a schema.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BufferDecl {
    pub name: String,
    pub hash: HashValue<str>,
    pub ty: SchemaType,
    /// Floats per vertex. Implied by `ty` unless declared explicitly.
    pub components: u8,
}

/// One uniform slot of a schema.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct UniformDecl {
    pub name: String,
    pub hash: HashValue<str>,
    pub ty: SchemaType,
    /// Uploaded whenever a draw omits this uniform.
    pub default: Option<UniformValue>,
}

/// One texture slot of a schema.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TextureDecl {
    pub name: String,
    pub hash: HashValue<str>,
    pub ty: SchemaType,
}

/// The declared interface of a program. Slot order is preserved, so texture
/// units are assigned deterministically from declaration order.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub buffers: Vec<BufferDecl>,
    pub uniforms: Vec<UniformDecl>,
    pub textures: Vec<TextureDecl>,
    pub mode: DrawMode,
}

impl Schema {
    pub fn buffer(&self, name: HashValue<str>) -> Option<&BufferDecl> {
        self.buffers.iter().find(|v| v.hash == name)
    }

    pub fn uniform(&self, name: HashValue<str>) -> Option<&UniformDecl> {
        self.uniforms.iter().find(|v| v.hash == name)
    }

    pub fn texture(&self, name: HashValue<str>) -> Option<&TextureDecl> {
        self.textures.iter().find(|v| v.hash == name)
    }
}

/// A preprocessor definition injected into both stages before compilation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Define {
    pub name: String,
    pub value: String,
}

/// Everything needed to create a shader program besides the source strings.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct ShaderParams {
    pub schema: Schema,
    pub defines: Vec<Define>,
}

impl ShaderParams {
    pub fn build() -> ShaderParamsBuilder {
        ShaderParamsBuilder::new()
    }

    /// Checks the schema before any device object is created.
    pub fn validate(&self, vs: &str, fs: &str) -> Result<()> {
        if vs.is_empty() {
            return Err(Error::ShaderInvalid(
                "Vertex shader source is required.".into(),
            ));
        }

        if fs.is_empty() {
            return Err(Error::ShaderInvalid(
                "Fragment shader source is required.".into(),
            ));
        }

        if self.schema.buffers.len() > MAX_VERTEX_ATTRIBUTES {
            return Err(Error::ShaderInvalid(format!(
                "Too many attribute buffers (max {}).",
                MAX_VERTEX_ATTRIBUTES
            )));
        }

        if self.schema.uniforms.len() > MAX_UNIFORM_VARIABLES {
            return Err(Error::ShaderInvalid(format!(
                "Too many uniforms (max {}).",
                MAX_UNIFORM_VARIABLES
            )));
        }

        if self.schema.textures.len() > MAX_TEXTURE_SLOTS {
            return Err(Error::ShaderInvalid(format!(
                "Too many texture slots (max {}).",
                MAX_TEXTURE_SLOTS
            )));
        }

        let mut names = FastHashSet::default();
        let all = self
            .schema
            .buffers
            .iter()
            .map(|v| (&v.name, v.hash))
            .chain(self.schema.uniforms.iter().map(|v| (&v.name, v.hash)))
            .chain(self.schema.textures.iter().map(|v| (&v.name, v.hash)));

        for (name, hash) in all {
            if !names.insert(hash) {
                return Err(Error::ShaderInvalid(format!(
                    "Duplicate schema name '{}'.",
                    name
                )));
            }
        }

        for v in &self.schema.buffers {
            match v.ty.components() {
                Some(_) if v.components >= 1 && v.components <= 4 => {}
                Some(_) => {
                    return Err(Error::ShaderInvalid(format!(
                        "Buffer '{}' declares {} components (expected 1 to 4).",
                        v.name, v.components
                    )));
                }
                None => {
                    return Err(Error::ShaderInvalid(format!(
                        "Buffer '{}' must declare a float or float vector type.",
                        v.name
                    )));
                }
            }
        }

        for v in &self.schema.uniforms {
            if v.ty.is_sampler() {
                return Err(Error::ShaderInvalid(format!(
                    "Uniform '{}' has a sampler type. Declare it as a texture slot instead.",
                    v.name
                )));
            }

            if let Some(default) = v.default {
                if default.schema_type() != v.ty {
                    return Err(Error::ShaderInvalid(format!(
                        "Default value of uniform '{}' is {:?} (declared {:?}).",
                        v.name,
                        default.schema_type(),
                        v.ty
                    )));
                }
            }
        }

        for v in &self.schema.textures {
            if !v.ty.is_sampler() {
                return Err(Error::ShaderInvalid(format!(
                    "Texture slot '{}' must declare a sampler type.",
                    v.name
                )));
            }
        }

        Ok(())
    }

    /// Prepends the `#define` prelude to a stage source. A leading `#version`
    /// directive stays on the first line.
    pub fn inject(&self, source: &str) -> String {
        let prelude = self.prelude();
        if prelude.is_empty() {
            return source.to_owned();
        }

        if source.starts_with("#version") {
            match source.find('\n') {
                Some(eol) => {
                    let (version, body) = source.split_at(eol + 1);
                    format!("{}{}{}", version, prelude, body)
                }
                None => format!("{}\n{}", source, prelude),
            }
        } else {
            format!("{}{}", prelude, source)
        }
    }

    fn prelude(&self) -> String {
        let mut buf = String::new();
        for v in &self.defines {
            // Definitions without a value are omitted entirely, so shaders
            // can probe them with #ifdef.
            if !v.value.is_empty() {
                buf.push_str("#define ");
                buf.push_str(&v.name);
                buf.push(' ');
                buf.push_str(&v.value);
                buf.push('\n');
            }
        }
        buf
    }
}

/// Fluent construction of [`ShaderParams`]. Re-declaring a name replaces the
/// earlier entry in place.
#[derive(Debug, Default)]
pub struct ShaderParamsBuilder(ShaderParams);

impl ShaderParamsBuilder {
    pub fn new() -> Self {
        ShaderParamsBuilder(ShaderParams::default())
    }

    /// Declares an attribute buffer with the component count implied by `ty`.
    pub fn buffer<T: Into<String>>(self, name: T, ty: SchemaType) -> Self {
        let components = ty.components().unwrap_or(0);
        self.buffer_sized(name, ty, components)
    }

    /// Declares an attribute buffer with an explicit per-vertex float count.
    pub fn buffer_sized<T: Into<String>>(mut self, name: T, ty: SchemaType, components: u8) -> Self {
        let name = name.into();
        let hash = HashValue::from(&name);
        let decl = BufferDecl {
            name,
            hash,
            ty,
            components,
        };

        if let Some(v) = self.0.schema.buffers.iter_mut().find(|v| v.hash == hash) {
            *v = decl;
            return self;
        }

        self.0.schema.buffers.push(decl);
        self
    }

    pub fn uniform<T: Into<String>>(mut self, name: T, ty: SchemaType) -> Self {
        self.push_uniform(name.into(), ty, None);
        self
    }

    /// Declares a uniform with a fallback value for draws that omit it.
    pub fn uniform_default<T, U>(mut self, name: T, ty: SchemaType, default: U) -> Self
    where
        T: Into<String>,
        U: Into<UniformValue>,
    {
        self.push_uniform(name.into(), ty, Some(default.into()));
        self
    }

    pub fn texture_2d<T: Into<String>>(mut self, name: T) -> Self {
        self.push_texture(name.into(), SchemaType::Texture2D);
        self
    }

    pub fn texture_cube<T: Into<String>>(mut self, name: T) -> Self {
        self.push_texture(name.into(), SchemaType::TextureCube);
        self
    }

    pub fn mode(mut self, mode: DrawMode) -> Self {
        self.0.schema.mode = mode;
        self
    }

    pub fn define<T: Into<String>, U: Into<String>>(mut self, name: T, value: U) -> Self {
        let name = name.into();
        let value = value.into();

        if let Some(v) = self.0.defines.iter_mut().find(|v| v.name == name) {
            v.value = value;
            return self;
        }

        self.0.defines.push(Define { name, value });
        self
    }

    pub fn finish(self) -> ShaderParams {
        self.0
    }

    fn push_uniform(&mut self, name: String, ty: SchemaType, default: Option<UniformValue>) {
        let hash = HashValue::from(&name);
        let decl = UniformDecl {
            name,
            hash,
            ty,
            default,
        };

        if let Some(v) = self.0.schema.uniforms.iter_mut().find(|v| v.hash == hash) {
            *v = decl;
            return;
        }

        self.0.schema.uniforms.push(decl);
    }

    fn push_texture(&mut self, name: String, ty: SchemaType) {
        let hash = HashValue::from(&name);
        let decl = TextureDecl { name, hash, ty };

        if let Some(v) = self.0.schema.textures.iter_mut().find(|v| v.hash == hash) {
            *v = decl;
            return;
        }

        self.0.schema.textures.push(decl);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_preserves_declaration_order() {
        let params = ShaderParams::build()
            .uniform("model", SchemaType::Matrix4f)
            .uniform("view", SchemaType::Matrix4f)
            .texture_2d("albedo")
            .texture_2d("normal")
            .finish();

        let uniforms: Vec<_> = params
            .schema
            .uniforms
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(uniforms, ["model", "view"]);

        let textures: Vec<_> = params
            .schema
            .textures
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(textures, ["albedo", "normal"]);
    }

    #[test]
    fn builder_replaces_redeclared_names_in_place() {
        let params = ShaderParams::build()
            .buffer("position", SchemaType::Vector2f)
            .buffer("normal", SchemaType::Vector3f)
            .buffer("position", SchemaType::Vector3f)
            .finish();

        assert_eq!(params.schema.buffers.len(), 2);
        assert_eq!(params.schema.buffers[0].name, "position");
        assert_eq!(params.schema.buffers[0].components, 3);
    }

    #[test]
    fn validate_rejects_bad_schemas() {
        let vs = "void main() {}";
        let fs = "void main() {}";

        let ok = ShaderParams::build()
            .buffer("position", SchemaType::Vector3f)
            .uniform("tint", SchemaType::Vector4f)
            .texture_2d("albedo")
            .finish();
        assert!(ok.validate(vs, fs).is_ok());
        assert!(ok.validate("", fs).is_err());

        let dup = ShaderParams::build()
            .buffer("position", SchemaType::Vector3f)
            .uniform("position", SchemaType::F32)
            .finish();
        assert!(dup.validate(vs, fs).is_err());

        let sampler_uniform = ShaderParams::build()
            .uniform("albedo", SchemaType::Texture2D)
            .finish();
        assert!(sampler_uniform.validate(vs, fs).is_err());

        let matrix_buffer = ShaderParams::build()
            .buffer("position", SchemaType::Matrix4f)
            .finish();
        assert!(matrix_buffer.validate(vs, fs).is_err());

        let mismatch = ShaderParams::build()
            .uniform_default("tint", SchemaType::Vector4f, 1.0f32)
            .finish();
        assert!(mismatch.validate(vs, fs).is_err());
    }

    #[test]
    fn inject_keeps_version_directive_first() {
        let params = ShaderParams::build().define("LIT", "1").finish();

        let injected = params.inject("#version 100\nvoid main() {}");
        assert_eq!(injected, "#version 100\n#define LIT 1\nvoid main() {}");

        let injected = params.inject("void main() {}");
        assert_eq!(injected, "#define LIT 1\nvoid main() {}");
    }

    #[test]
    fn inject_omits_defines_without_values() {
        let params = ShaderParams::build()
            .define("LIT", "1")
            .define("SHADOWS", "")
            .finish();

        let injected = params.inject("void main() {}");
        assert!(injected.contains("#define LIT 1"));
        assert!(!injected.contains("SHADOWS"));
    }

    #[test]
    fn uniform_value_conversions() {
        let v: UniformValue = 2i32.into();
        assert_eq!(v, UniformValue::I32(2));

        let v: UniformValue = [0.0f32, 1.0].into();
        assert_eq!(v.schema_type(), SchemaType::Vector2f);

        let v: UniformValue = Vector3::new(1.0f32, 2.0, 3.0).into();
        assert_eq!(v, UniformValue::Vector3f([1.0, 2.0, 3.0]));

        let v: UniformValue = Matrix4::from_scale(2.0f32).into();
        assert_eq!(v.schema_type(), SchemaType::Matrix4f);
    }
}
