//! Animation targets and property paths
//!
//! Timelines never own what they animate. They address scene objects and
//! document elements by name and hand every computed value to a
//! [`PropertySink`], which resolves the name and applies the write.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::error::AnimationError;

/// Named thing a keyframe writes to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// Scene object, light or camera
    Object(String),
    /// Document element
    Element(String),
}

impl Target {
    pub fn object(name: impl Into<String>) -> Self {
        Target::Object(name.into())
    }

    pub fn element(id: impl Into<String>) -> Self {
        Target::Element(id.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Target::Object(name) | Target::Element(name) => name,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Object(name) => write!(f, "object:{name}"),
            Target::Element(id) => write!(f, "#{id}"),
        }
    }
}

/// Animatable scalar property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyPath {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    /// All three scale axes at once
    Scale,
    /// Material or element opacity
    Opacity,
    /// Material emissive intensity
    EmissiveIntensity,
    /// Light intensity
    Intensity,
    /// Element translation in logical pixels
    TranslateX,
    TranslateY,
}

impl PropertyPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyPath::PositionX => "position.x",
            PropertyPath::PositionY => "position.y",
            PropertyPath::PositionZ => "position.z",
            PropertyPath::RotationX => "rotation.x",
            PropertyPath::RotationY => "rotation.y",
            PropertyPath::RotationZ => "rotation.z",
            PropertyPath::ScaleX => "scale.x",
            PropertyPath::ScaleY => "scale.y",
            PropertyPath::ScaleZ => "scale.z",
            PropertyPath::Scale => "scale",
            PropertyPath::Opacity => "opacity",
            PropertyPath::EmissiveIntensity => "material.emissiveIntensity",
            PropertyPath::Intensity => "intensity",
            PropertyPath::TranslateX => "translate.x",
            PropertyPath::TranslateY => "translate.y",
        }
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyPath {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = match s.trim() {
            "position.x" => PropertyPath::PositionX,
            "position.y" => PropertyPath::PositionY,
            "position.z" => PropertyPath::PositionZ,
            "rotation.x" => PropertyPath::RotationX,
            "rotation.y" => PropertyPath::RotationY,
            "rotation.z" => PropertyPath::RotationZ,
            "scale.x" | "scaleX" => PropertyPath::ScaleX,
            "scale.y" | "scaleY" => PropertyPath::ScaleY,
            "scale.z" => PropertyPath::ScaleZ,
            "scale" => PropertyPath::Scale,
            "opacity" | "material.opacity" => PropertyPath::Opacity,
            "material.emissiveIntensity" | "emissiveIntensity" => {
                PropertyPath::EmissiveIntensity
            }
            "intensity" => PropertyPath::Intensity,
            "translate.x" | "x" => PropertyPath::TranslateX,
            "translate.y" | "y" => PropertyPath::TranslateY,
            other => return Err(AnimationError::UnknownProperty(other.to_string())),
        };
        Ok(path)
    }
}

/// Reasons a sink rejects a write
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("No target named {0}")]
    UnknownTarget(String),

    #[error("{target} has no property {property}")]
    Unsupported {
        target: String,
        property: PropertyPath,
    },
}

/// Receiver of timeline output
pub trait PropertySink {
    /// Apply one computed value
    fn write(
        &mut self,
        target: &Target,
        property: PropertyPath,
        value: f32,
    ) -> Result<(), SinkError>;

    /// Current value, `None` if the target or property does not resolve
    fn read(&self, target: &Target, property: PropertyPath) -> Option<f32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_paths_round_trip_through_display() {
        for path in [
            PropertyPath::PositionY,
            PropertyPath::RotationX,
            PropertyPath::Scale,
            PropertyPath::EmissiveIntensity,
            PropertyPath::TranslateY,
        ] {
            assert_eq!(path.to_string().parse::<PropertyPath>().unwrap(), path);
        }
        assert_eq!("y".parse::<PropertyPath>().unwrap(), PropertyPath::TranslateY);
        assert!("colour".parse::<PropertyPath>().is_err());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::object("core").to_string(), "object:core");
        assert_eq!(Target::element("scroll-progress").to_string(), "#scroll-progress");
    }
}
