//! Plain JSON device dumps.
//!
//! A dump maps layer names (`DEVICE_P3_NOISO`, `HANDLE_P0`, `VIAS_ETCH`, ...)
//! to polygons. Each polygon is a list of rings, the first ring being the
//! exterior and the rest holes; each ring is a list of `[x, y]` points in um.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use maskforge_core::{Device, LayerKey, Point, PolygonSet, ShapeLibrary};

pub type Ring = Vec<[f64; 2]>;

#[derive(Error, Debug)]
pub enum DeviceFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed device file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polygon {index} on layer {layer} has no rings")]
    EmptyPolygon { layer: LayerKey, index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceFile {
    pub name: String,
    #[serde(default)]
    pub layers: BTreeMap<LayerKey, Vec<Vec<Ring>>>,
}

impl DeviceFile {
    pub fn from_json(json: &str) -> Result<Self, DeviceFileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeviceFileError> {
        let path = path.as_ref();
        let file = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!(
            "Loaded device '{}' ({} layers) from {}",
            file.name,
            file.layers.len(),
            path.display()
        );
        Ok(file)
    }

    pub fn to_json(&self) -> Result<String, DeviceFileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Geometry is taken as-is; validation happens when the resolver
    /// extracts each layer.
    pub fn to_device(&self) -> Result<Device, DeviceFileError> {
        let mut device = Device::new(&self.name);
        for (&layer, polygons) in &self.layers {
            let mut set = PolygonSet::empty();
            for (index, rings) in polygons.iter().enumerate() {
                let Some((exterior, holes)) = rings.split_first() else {
                    return Err(DeviceFileError::EmptyPolygon { layer, index });
                };
                let holes: Vec<Vec<Point>> = holes.iter().map(|h| to_points(h)).collect();
                set = set.concat(&PolygonSet::from_rings(&to_points(exterior), &holes));
            }
            device.insert(layer, set);
        }
        Ok(device)
    }

    pub fn from_device(device: &Device) -> Self {
        let layers = device
            .layers()
            .map(|(key, set)| {
                let polygons: Vec<Vec<Ring>> = set
                    .polygons()
                    .iter()
                    .map(|polygon| {
                        std::iter::once(polygon.exterior())
                            .chain(polygon.interiors())
                            .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect::<Ring>())
                            .collect()
                    })
                    .collect();
                (*key, polygons)
            })
            .collect();
        Self {
            name: device.name.clone(),
            layers,
        }
    }
}

fn to_points(ring: &[[f64; 2]]) -> Vec<Point> {
    ring.iter().map(|[x, y]| Point::new(*x, *y)).collect()
}

impl ShapeLibrary for DeviceFile {
    type Error = DeviceFileError;

    /// A dump is already generated geometry, so the label is not engraved.
    fn build_device(&self, label: &str) -> Result<Device, Self::Error> {
        log::debug!("Device '{}' read from dump, label {:?} not applied", self.name, label);
        self.to_device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maskforge_core::{Channel, Priority, Variant};

    const DUMP: &str = r#"{
        "name": "flexure",
        "layers": {
            "DEVICE_P3_NOISO": [[[[0, 0], [10, 0], [10, 10], [0, 10]]]],
            "HANDLE_P0": [
                [[[0, 0], [20, 0], [20, 20], [0, 20]], [[5, 5], [15, 5], [15, 15], [5, 15]]]
            ],
            "VIAS_ETCH": []
        }
    }"#;

    #[test]
    fn test_dump_to_device() {
        let device = DeviceFile::from_json(DUMP).unwrap().to_device().unwrap();
        assert_eq!(device.name, "flexure");
        assert_eq!(device.layer_count(), 3);

        let noiso = device
            .layer(LayerKey::device_tier(Priority::new(3).unwrap(), Variant::NoIso))
            .unwrap();
        assert!((noiso.area() - 100.0).abs() < 1e-9);

        let holed = device.layer(LayerKey::handle_tier(Priority::HIGHEST)).unwrap();
        assert_eq!(holed.polygons()[0].interiors().len(), 1);
        assert!((holed.area() - 300.0).abs() < 1e-9);

        assert!(device.layer(Channel::ViasEtch.into()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_layer_name_rejected() {
        let err = DeviceFile::from_json(r#"{"name": "x", "layers": {"HANDLE_P1_NOISO": []}}"#)
            .unwrap_err();
        assert!(matches!(err, DeviceFileError::Json(_)));
    }

    #[test]
    fn test_polygon_without_rings_rejected() {
        let file = DeviceFile::from_json(r#"{"name": "x", "layers": {"TIP": [[]]}}"#).unwrap();
        assert!(matches!(
            file.build_device("Ver 1"),
            Err(DeviceFileError::EmptyPolygon { index: 0, .. })
        ));
    }

    #[test]
    fn test_from_device_keeps_geometry() {
        let device = DeviceFile::from_json(DUMP).unwrap().to_device().unwrap();
        let again = DeviceFile::from_device(&device).to_device().unwrap();
        for (key, set) in device.layers() {
            let other = again.layer(*key).unwrap();
            assert!((set.area() - other.area()).abs() < 1e-9);
        }
    }
}
