use maskforge_core::Channel;
use maskforge_io::{ArtifactStage, BuildSettings, DeviceFile};
use maskforge_resolve::Pipeline;

const SETTINGS: &str = r#"{
    "version": "7",
    "hash": "f00dfacecafe",
    "device_cd_compensation": 0.0,
    "device_isolation": [2, 1, 0, 0, 0, 0, 0, 0],
    "handle_isolation": 5,
    "chip_size": 200
}"#;

const DEVICE: &str = r#"{
    "name": "two_tier",
    "layers": {
        "DEVICE_P0": [[[[0, 0], [10, 0], [10, 10], [0, 10]]]],
        "DEVICE_P1": [[[[5, 0], [15, 0], [15, 10], [5, 10]]]],
        "HANDLE_P0": [[[[-50, -50], [-40, -50], [-40, -40], [-50, -40]]]],
        "TIP": [[[[95, 0], [105, 0], [105, 1], [95, 1]]]]
    }
}"#;

#[test]
fn test_settings_and_dump_drive_a_build() {
    let _ = env_logger::builder().is_test(true).try_init();

    let settings = BuildSettings::from_json(SETTINGS).unwrap();
    let library = DeviceFile::from_json(DEVICE).unwrap();
    let pipeline = Pipeline::from_config(settings.resolve_config()).unwrap();

    let mask = pipeline
        .run_library(&library, &settings.version_label("2024-01-01"), &settings.chip_outline())
        .unwrap();

    assert!((mask.layer(Channel::Device).unwrap().area() - 130.0).abs() < 1e-6);
    assert!((mask.layer(Channel::HandleRemove).unwrap().area() - 300.0).abs() < 1e-6);
    assert!((mask.layer(Channel::Tip).unwrap().area() - 5.0).abs() < 1e-6);
    assert_eq!(
        settings.artifact_name(ArtifactStage::Build),
        "mega_2d_7_BUILD.gds"
    );
}
