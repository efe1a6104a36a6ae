//! Shader stage, source dialect, and target-version types (spec §1, §4.7).
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pipeline stage a compilation targets (spec §1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ShaderStage {
    Vertex,
    Fragment,
    TesselationControl,
    TesselationEvaluation,
    Geometry,
    Compute,
}

impl ShaderStage {
    /// Per-stage floor from table 4.7a, before any construct raises it further.
    pub const fn minimum_glsl_version(self) -> u32 {
        match self {
            ShaderStage::Vertex | ShaderStage::Fragment => 130,
            ShaderStage::Geometry => 150,
            ShaderStage::TesselationControl | ShaderStage::TesselationEvaluation => 400,
            ShaderStage::Compute => 430,
        }
    }
}

impl FromStr for ShaderStage {
    type Err = ();

    fn from_str(input: &str) -> Result<ShaderStage, Self::Err> {
        match input.to_lowercase().as_str() {
            "vertex" => Ok(ShaderStage::Vertex),
            "fragment" | "pixel" => Ok(ShaderStage::Fragment),
            "tesselationcontrol" | "hull" => Ok(ShaderStage::TesselationControl),
            "tesselationevaluation" | "domain" => Ok(ShaderStage::TesselationEvaluation),
            "geometry" => Ok(ShaderStage::Geometry),
            "compute" => Ok(ShaderStage::Compute),
            _ => Err(()),
        }
    }
}

impl ToString for ShaderStage {
    fn to_string(&self) -> String {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::TesselationControl => "tesselationcontrol",
            ShaderStage::TesselationEvaluation => "tesselationevaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Compute => "compute",
        }
        .to_string()
    }
}

/// HLSL input-dialect version (spec §6 "input-dialect version").
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum HlslVersion {
    Hlsl3,
    #[default]
    Hlsl4,
    Hlsl5,
}

/// Output dialect family: GLSL proper, ESSL (GLSL ES), or VKSL (Vulkan GLSL).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TargetDialect {
    Glsl,
    Essl,
    Vksl,
}

impl Default for TargetDialect {
    fn default() -> Self {
        TargetDialect::Glsl
    }
}

/// Target language version, including the "auto-detect" sentinel (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetVersion {
    /// Compute the minimum version from constructs actually used (spec §4.7).
    Auto,
    Explicit(u32),
}

impl Default for TargetVersion {
    fn default() -> Self {
        TargetVersion::Auto
    }
}

/// The full output target: dialect plus version sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderTarget {
    pub dialect: TargetDialect,
    pub version: TargetVersion,
}

impl Default for ShaderTarget {
    fn default() -> Self {
        Self { dialect: TargetDialect::Glsl, version: TargetVersion::Auto }
    }
}

impl ShaderTarget {
    pub fn glsl(version: u32) -> Self {
        Self { dialect: TargetDialect::Glsl, version: TargetVersion::Explicit(version) }
    }

    pub fn auto(dialect: TargetDialect) -> Self {
        Self { dialect, version: TargetVersion::Auto }
    }
}
