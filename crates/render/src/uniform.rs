use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

use crate::backend::BackendError;

/// Type of a declared shader uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    Mat2,
    Mat3,
    Mat4,
}

impl UniformKind {
    /// Size in bytes inside a uniform buffer.
    pub const fn size(self) -> usize {
        match self {
            Self::Int | Self::Float | Self::Bool => 4,
            Self::Vec2 | Self::IVec2 => 8,
            Self::Vec3 | Self::IVec3 => 12,
            Self::Vec4 | Self::IVec4 | Self::Mat2 => 16,
            Self::Mat3 => 48,
            Self::Mat4 => 64,
        }
    }

    /// Required alignment inside a uniform buffer.
    pub const fn align(self) -> usize {
        match self {
            Self::Int | Self::Float | Self::Bool => 4,
            Self::Vec2 | Self::IVec2 | Self::Mat2 => 8,
            Self::Vec3 | Self::IVec3 | Self::Vec4 | Self::IVec4 | Self::Mat3 | Self::Mat4 => 16,
        }
    }
}

/// A value to upload into a uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Int(_) => UniformKind::Int,
            Self::Float(_) => UniformKind::Float,
            Self::Bool(_) => UniformKind::Bool,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::IVec2(_) => UniformKind::IVec2,
            Self::IVec3(_) => UniformKind::IVec3,
            Self::IVec4(_) => UniformKind::IVec4,
            Self::Mat2(_) => UniformKind::Mat2,
            Self::Mat3(_) => UniformKind::Mat3,
            Self::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Write the value at the start of `out`, which must be at least
    /// `self.kind().size()` bytes. Matrix columns are padded the way WGSL
    /// lays them out; bools are stored as 32-bit integers.
    fn write(&self, out: &mut [u8]) {
        fn put(out: &mut [u8], offset: usize, bytes: &[u8]) {
            out[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        match self {
            Self::Int(v) => put(out, 0, &v.to_le_bytes()),
            Self::Float(v) => put(out, 0, &v.to_le_bytes()),
            Self::Bool(v) => put(out, 0, &u32::from(*v).to_le_bytes()),
            Self::Vec2(v) => put(out, 0, bytemuck::cast_slice(&v.to_array())),
            Self::Vec3(v) => put(out, 0, bytemuck::cast_slice(&v.to_array())),
            Self::Vec4(v) => put(out, 0, bytemuck::cast_slice(&v.to_array())),
            Self::IVec2(v) => put(out, 0, bytemuck::cast_slice(&v.to_array())),
            Self::IVec3(v) => put(out, 0, bytemuck::cast_slice(&v.to_array())),
            Self::IVec4(v) => put(out, 0, bytemuck::cast_slice(&v.to_array())),
            Self::Mat2(m) => put(out, 0, bytemuck::cast_slice(&m.to_cols_array())),
            Self::Mat3(m) => {
                for (i, col) in m.to_cols_array_2d().iter().enumerate() {
                    put(out, i * 16, bytemuck::cast_slice(col));
                }
            }
            Self::Mat4(m) => put(out, 0, bytemuck::cast_slice(&m.to_cols_array())),
        }
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        Self::Mat4(m)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct UniformSlot {
    name: String,
    kind: UniformKind,
    offset: usize,
}

/// CPU copy of a program's uniform buffer.
///
/// Uniforms are laid out in declaration order following WGSL's uniform
/// address space rules, so the shader declares a struct with the same
/// fields in the same order.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    program: String,
    slots: Vec<UniformSlot>,
    data: Vec<u8>,
}

const fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

impl UniformBlock {
    pub fn new(program: &str, decls: &[(String, UniformKind)]) -> Result<Self, BackendError> {
        let mut slots: Vec<UniformSlot> = Vec::with_capacity(decls.len());
        let mut offset = 0;
        for (name, kind) in decls {
            if slots.iter().any(|s| &s.name == name) {
                return Err(BackendError::DuplicateUniform {
                    program: program.to_string(),
                    name: name.clone(),
                });
            }
            offset = round_up(offset, kind.align());
            slots.push(UniformSlot {
                name: name.clone(),
                kind: *kind,
                offset,
            });
            offset += kind.size();
        }
        let size = round_up(offset, 16).max(16);
        Ok(Self {
            program: program.to_string(),
            slots,
            data: vec![0; size],
        })
    }

    /// Total buffer size in bytes; a non-zero multiple of 16.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().find(|s| s.name == name).map(|s| s.offset)
    }

    pub fn kind_of(&self, name: &str) -> Option<UniformKind> {
        self.slots.iter().find(|s| s.name == name).map(|s| s.kind)
    }

    /// Type-check and store a uniform value.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), BackendError> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| BackendError::UnknownUniform {
                program: self.program.clone(),
                name: name.to_string(),
            })?;
        if slot.kind != value.kind() {
            return Err(BackendError::UniformTypeMismatch {
                name: name.to_string(),
                expected: slot.kind,
                found: value.kind(),
            });
        }
        let (offset, size) = (slot.offset, slot.kind.size());
        value.write(&mut self.data[offset..offset + size]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls(list: &[(&str, UniformKind)]) -> Vec<(String, UniformKind)> {
        list.iter().map(|(n, k)| (n.to_string(), *k)).collect()
    }

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn matrices_pack_back_to_back() {
        let block = UniformBlock::new(
            "voxel",
            &decls(&[
                ("modelView", UniformKind::Mat4),
                ("cameraView", UniformKind::Mat4),
                ("cameraProjection", UniformKind::Mat4),
            ]),
        )
        .unwrap();
        assert_eq!(block.offset_of("modelView"), Some(0));
        assert_eq!(block.offset_of("cameraView"), Some(64));
        assert_eq!(block.offset_of("cameraProjection"), Some(128));
        assert_eq!(block.size(), 192);
    }

    #[test]
    fn vec3_aligns_to_sixteen_and_scalar_fills_tail() {
        let block = UniformBlock::new(
            "p",
            &decls(&[
                ("scale", UniformKind::Float),
                ("tint", UniformKind::Vec3),
                ("alpha", UniformKind::Float),
            ]),
        )
        .unwrap();
        assert_eq!(block.offset_of("scale"), Some(0));
        assert_eq!(block.offset_of("tint"), Some(16));
        assert_eq!(block.offset_of("alpha"), Some(28));
        assert_eq!(block.size(), 32);
    }

    #[test]
    fn mat2_and_mat3_layouts() {
        let block = UniformBlock::new(
            "p",
            &decls(&[
                ("f", UniformKind::Float),
                ("m2", UniformKind::Mat2),
                ("m3", UniformKind::Mat3),
            ]),
        )
        .unwrap();
        assert_eq!(block.offset_of("m2"), Some(8));
        assert_eq!(block.offset_of("m3"), Some(32));
        assert_eq!(block.size(), 80);
    }

    #[test]
    fn empty_block_still_has_sixteen_bytes() {
        let block = UniformBlock::new("p", &[]).unwrap();
        assert_eq!(block.size(), 16);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = UniformBlock::new(
            "p",
            &decls(&[("a", UniformKind::Float), ("a", UniformKind::Int)]),
        )
        .unwrap_err();
        assert!(matches!(err, BackendError::DuplicateUniform { .. }));
    }

    #[test]
    fn set_writes_bytes_at_offset() {
        let mut block = UniformBlock::new(
            "p",
            &decls(&[("s", UniformKind::Float), ("m", UniformKind::Mat4)]),
        )
        .unwrap();
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        block.set("m", m.into()).unwrap();
        block.set("s", 0.5_f32.into()).unwrap();
        let bytes = block.bytes();
        assert_eq!(f32_at(bytes, 0), 0.5);
        // translation lives in column 3
        assert_eq!(f32_at(bytes, 16 + 48), 1.0);
        assert_eq!(f32_at(bytes, 16 + 52), 2.0);
        assert_eq!(f32_at(bytes, 16 + 56), 3.0);
    }

    #[test]
    fn mat3_columns_are_padded() {
        let mut block = UniformBlock::new("p", &decls(&[("m", UniformKind::Mat3)])).unwrap();
        block
            .set(
                "m",
                UniformValue::Mat3(Mat3::from_cols(Vec3::X, Vec3::Y * 2.0, Vec3::Z * 3.0)),
            )
            .unwrap();
        let bytes = block.bytes();
        assert_eq!(f32_at(bytes, 0), 1.0);
        assert_eq!(f32_at(bytes, 16 + 4), 2.0);
        assert_eq!(f32_at(bytes, 32 + 8), 3.0);
    }

    #[test]
    fn bool_stored_as_u32() {
        let mut block = UniformBlock::new("p", &decls(&[("on", UniformKind::Bool)])).unwrap();
        block.set("on", true.into()).unwrap();
        assert_eq!(&block.bytes()[0..4], &1u32.to_le_bytes());
    }

    #[test]
    fn unknown_uniform_rejected() {
        let mut block = UniformBlock::new("voxel", &[]).unwrap();
        let err = block.set("missing", 1.0_f32.into()).unwrap_err();
        assert!(matches!(
            err,
            BackendError::UnknownUniform { ref program, ref name }
                if program == "voxel" && name == "missing"
        ));
    }

    #[test]
    fn type_mismatch_rejected() {
        let mut block = UniformBlock::new("p", &decls(&[("m", UniformKind::Mat4)])).unwrap();
        let err = block.set("m", Vec3::ONE.into()).unwrap_err();
        assert!(matches!(
            err,
            BackendError::UniformTypeMismatch {
                expected: UniformKind::Mat4,
                found: UniformKind::Vec3,
                ..
            }
        ));
    }
}
