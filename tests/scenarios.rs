#![allow(missing_docs)]

use std::collections::HashSet;

use rpd_match::{Config, evaluate_path, map_objects, map_objects_with};
use serde_json::{Value, json};

/// Wraps zones (and segment-level systems) in the RPD building layout.
fn rpd(zones: Value, systems: Value, plant: Value) -> Value {
    let mut document = json!({
        "id": "model",
        "buildings": [{
            "id": "building",
            "building_segments": [{
                "id": "segment",
                "zones": zones,
                "heating_ventilating_air_conditioning_systems": systems,
            }],
        }],
    });
    if let (Some(document), Value::Object(plant)) = (document.as_object_mut(), plant) {
        document.extend(plant);
    }
    document
}

fn zones(ids: &[&str]) -> Value {
    ids.iter().map(|id| json!({"id": id})).collect()
}

fn wall(id: &str, far: &str, tilt: f64, azimuth: f64, area: f64) -> Value {
    json!({
        "id": id,
        "classification": "WALL",
        "adjacent_to": "INTERIOR",
        "adjacent_zone": far,
        "tilt": tilt,
        "azimuth": azimuth,
        "area": area,
    })
}

#[test]
fn rooms_map_to_zones_by_number() {
    let generated = rpd(
        zones(&["Room 3", "Room 1", "Room 2", "Room 5", "Room 4"]),
        json!([]),
        json!({}),
    );
    let reference = rpd(
        zones(&["Zone 1", "Zone 2", "Zone 3", "Zone 4", "Zone 5"]),
        json!([]),
        json!({}),
    );

    let (map, warnings, errors) = map_objects(&generated, &reference).into_parts();

    assert!(warnings.is_empty(), "{warnings:?}");
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(map.len(), 5);
    for i in 1..=5 {
        assert_eq!(map.get(&format!("Room {i}")), Some(format!("Zone {i}").as_str()));
    }
}

#[test]
fn indistinguishable_zone_names_halt_mapping() {
    let generated_zones: Vec<Value> = (1..=5)
        .map(|i| {
            json!({
                "id": format!("1 - {i} - 1"),
                "terminals": [{"id": format!("VAV {i}")}],
            })
        })
        .collect();
    let reference_zones: Vec<Value> = (1..=5)
        .map(|i| {
            json!({
                "id": format!("Zone {i}"),
                "terminals": [{"id": format!("VAV {i}")}],
            })
        })
        .collect();
    let generated = rpd(json!(generated_zones), json!([]), json!({}));
    let reference = rpd(json!(reference_zones), json!([]), json!({}));

    let (map, warnings, errors) = map_objects(&generated, &reference).into_parts();

    assert!(map.is_empty());
    assert!(warnings.is_empty());
    assert_eq!(
        errors,
        vec![
            "Zones: identifiers are indistinguishable; unmatched reference ids: \
             Zone 1, Zone 2, Zone 3, Zone 4, Zone 5"
                .to_string()
        ]
    );
}

fn exterior_zones() -> Value {
    let zones: Vec<Value> = ["A", "B", "C"]
        .iter()
        .map(|zone| {
            let mut surfaces: Vec<Value> = [0.0, 90.0, 180.0]
                .iter()
                .enumerate()
                .map(|(i, azimuth)| {
                    json!({
                        "id": format!("{zone}{i}"),
                        "adjacent_to": "EXTERIOR",
                        "azimuth": azimuth,
                        "optical_properties": {"absorptance_thermal_exterior": 0.9},
                    })
                })
                .collect();
            surfaces.push(json!({"id": format!("{zone}-int"), "adjacent_to": "INTERIOR"}));
            json!({"id": zone, "surfaces": surfaces})
        })
        .collect();
    json!({"zones": zones})
}

#[test]
fn filter_after_wildcard_selects_exterior_surfaces() {
    let document = exterior_zones();
    let results = evaluate_path(
        r#"$.zones[*].surfaces[*][?(@.adjacent_to = "EXTERIOR")]"#,
        &document,
    )
    .unwrap();
    assert_eq!(results.len(), 9);
    assert!(results.iter().all(|s| s["adjacent_to"] == "EXTERIOR"));
}

#[test]
fn conjunctive_filter_reaches_a_single_property() {
    let document = exterior_zones();
    let results = evaluate_path(
        r#"$.zones[*].surfaces[*][?(@.adjacent_to = "EXTERIOR" and @.id = "B1")].optical_properties.absorptance_thermal_exterior"#,
        &document,
    )
    .unwrap();
    assert_eq!(results, vec![&json!(0.9)]);
}

#[test]
fn interior_walls_map_by_translated_zone_pair() {
    let generated_zones: Vec<Value> = (1..=4)
        .map(|i| {
            json!({
                "id": format!("Room {i}"),
                "surfaces": [wall(
                    &format!("Room {i} partition"),
                    "Room 5",
                    90.0,
                    f64::from(i) * 45.0,
                    10.0 + f64::from(i),
                )],
            })
        })
        .chain([json!({"id": "Room 5", "surfaces": []})])
        .collect();

    // every wall recorded on the far zone, in a different order
    let reference_walls: Vec<Value> = [4, 2, 1, 3]
        .iter()
        .map(|&i| {
            wall(
                &format!("Core wall {i}"),
                &format!("Zone {i}"),
                90.0,
                (f64::from(i) * 45.0 + 180.0) % 360.0,
                10.0 + f64::from(i),
            )
        })
        .collect();
    let mut reference_zones: Vec<Value> = (1..=4)
        .map(|i| json!({"id": format!("Zone {i}"), "surfaces": []}))
        .collect();
    reference_zones.push(json!({"id": "Zone 5", "surfaces": reference_walls}));

    let generated = rpd(json!(generated_zones), json!([]), json!({}));
    let reference = rpd(json!(reference_zones), json!([]), json!({}));

    let (map, warnings, errors) = map_objects(&generated, &reference).into_parts();

    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.is_empty(), "{warnings:?}");
    for i in 1..=4 {
        assert_eq!(
            map.get(&format!("Room {i} partition")),
            Some(format!("Core wall {i}").as_str())
        );
    }
}

#[test]
fn interior_walls_map_from_either_side() {
    let generated = rpd(
        json!([
            {"id": "Room 1", "surfaces": [
                wall("g-a", "Room 2", 90.0, 0.0, 5.0),
                wall("g-b", "Room 2", 90.0, 90.0, 5.0),
            ]},
            {"id": "Room 2", "surfaces": []},
        ]),
        json!([]),
        json!({}),
    );
    let same_side = rpd(
        json!([
            {"id": "Zone 1", "surfaces": [
                wall("r-b", "Zone 2", 90.0, 90.0, 5.0),
                wall("r-a", "Zone 2", 90.0, 0.0, 5.0),
            ]},
            {"id": "Zone 2", "surfaces": []},
        ]),
        json!([]),
        json!({}),
    );
    let far_side = rpd(
        json!([
            {"id": "Zone 1", "surfaces": []},
            {"id": "Zone 2", "surfaces": [
                wall("r-a", "Zone 1", 90.0, 180.0, 5.0),
                wall("r-b", "Zone 1", 90.0, 270.0, 5.0),
            ]},
        ]),
        json!([]),
        json!({}),
    );

    let near = map_objects(&generated, &same_side);
    let far = map_objects(&generated, &far_side);

    assert!(!near.has_errors(), "{:?}", near.errors());
    assert_eq!(near.map, far.map);
    assert_eq!(near.map.get("g-a"), Some("r-a"));
    assert_eq!(near.map.get("g-b"), Some("r-b"));
}

fn generated_plant() -> Value {
    rpd(
        json!([
            {
                "id": "Room 1",
                "surfaces": [{"id": "R1-S", "classification": "WALL", "adjacent_to": "EXTERIOR", "azimuth": 180.0, "tilt": 90.0, "area": 20.0}],
                "terminals": [{"id": "T1", "served_by": "AHU-1"}],
            },
            {
                "id": "Room 2",
                "surfaces": [{"id": "R2-N", "classification": "WALL", "adjacent_to": "EXTERIOR", "azimuth": 0.0, "tilt": 90.0, "area": 20.0}],
                "terminals": [{"id": "T2", "served_by": "AHU-2"}],
            },
        ]),
        json!([
            {"id": "AHU-1", "heating_system": {"id": "AHU-1 heat", "hot_water_loop": "L-1"}},
            {"id": "AHU-2", "cooling_system": {"id": "AHU-2 cool", "chilled_water_loop": "L-2"}},
        ]),
        json!({
            "fluid_loops": [
                {"id": "L-1", "type": "HEATING", "child_loops": [{"id": "L-1a"}]},
                {"id": "L-2", "type": "COOLING"},
            ],
            "pumps": [
                {"id": "P-x", "loop_or_piping": "L-1"},
                {"id": "P-y", "loop_or_piping": "L-2"},
            ],
            "boilers": [{"id": "B-1", "loop": "L-1"}],
            "chillers": [{"id": "C-1", "cooling_loop": "L-2"}],
        }),
    )
}

fn reference_plant() -> Value {
    rpd(
        json!([
            {
                "id": "Zone 2",
                "surfaces": [{"id": "North wall", "classification": "WALL", "adjacent_to": "EXTERIOR", "azimuth": 0.0, "tilt": 90.0, "area": 20.0}],
                "terminals": [{"id": "Terminal B", "served_by": "System South"}],
            },
            {
                "id": "Zone 1",
                "surfaces": [{"id": "South wall", "classification": "WALL", "adjacent_to": "EXTERIOR", "azimuth": 180.0, "tilt": 90.0, "area": 20.0}],
                "terminals": [{"id": "Terminal A", "served_by": "System North"}],
            },
        ]),
        json!([
            {"id": "System South", "cooling_system": {"id": "South cooling", "chilled_water_loop": "CHW"}},
            {"id": "System North", "heating_system": {"id": "North heating", "hot_water_loop": "HHW"}},
        ]),
        json!({
            "fluid_loops": [
                {"id": "CHW", "type": "COOLING"},
                {"id": "HHW", "type": "HEATING", "child_loops": [{"id": "HHW Secondary"}]},
            ],
            "pumps": [
                {"id": "Pump 2", "loop_or_piping": "CHW"},
                {"id": "Pump 1", "loop_or_piping": "HHW"},
            ],
            "boilers": [{"id": "Boiler", "loop": "HHW"}],
            "chillers": [{"id": "Chiller", "cooling_loop": "CHW"}],
        }),
    )
}

#[test]
fn references_propagate_from_zones_to_plant() {
    let (map, warnings, errors) = map_objects(&generated_plant(), &reference_plant()).into_parts();

    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.is_empty(), "{warnings:?}");

    let expected = [
        ("Room 1", "Zone 1"),
        ("Room 2", "Zone 2"),
        ("R1-S", "South wall"),
        ("R2-N", "North wall"),
        ("T1", "Terminal A"),
        ("T2", "Terminal B"),
        ("AHU-1", "System North"),
        ("AHU-2", "System South"),
        ("L-1", "HHW"),
        ("L-1a", "HHW Secondary"),
        ("L-2", "CHW"),
        ("P-x", "Pump 1"),
        ("P-y", "Pump 2"),
        ("B-1", "Boiler"),
        ("C-1", "Chiller"),
    ];
    for (generated, reference) in expected {
        assert_eq!(map.get(generated), Some(reference), "{generated}");
    }
    assert_eq!(map.len(), expected.len());
}

#[test]
fn a_document_maps_onto_itself() {
    let document = generated_plant();
    let outcome = map_objects(&document, &document);

    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.map.len(), 15);
    assert!(outcome.map.iter().all(|(g, r)| g == r));
}

#[test]
fn the_map_is_injective() {
    let outcome = map_objects(&generated_plant(), &reference_plant());
    let images: HashSet<&str> = outcome.map.iter().map(|(_, r)| r).collect();
    assert_eq!(images.len(), outcome.map.len());
    for (g, r) in outcome.map.iter() {
        assert_eq!(outcome.map.preimage(r), Some(g));
    }
}

#[test]
fn unconnected_objects_fall_back_with_a_warning() {
    let mut generated = generated_plant();
    let mut reference = reference_plant();
    generated["exterior_lightings"] = json!([{"id": "Facade lights"}]);
    reference["exterior_lightings"] = json!([{"id": "Facade Lighting"}]);

    let (map, warnings, errors) = map_objects(&generated, &reference).into_parts();

    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(map.get("Facade lights"), Some("Facade Lighting"));
    assert_eq!(
        warnings,
        vec![
            "ExteriorLighting: mapped 'Facade lights' to 'Facade Lighting' by identifier \
             similarity only"
                .to_string()
        ]
    );
}

#[test]
fn a_category_count_mismatch_only_fails_that_category() {
    let generated = generated_plant();
    let mut reference = reference_plant();
    reference["pumps"]
        .as_array_mut()
        .unwrap()
        .push(json!({"id": "Pump 3", "loop_or_piping": "CHW"}));

    let (map, _, errors) = map_objects(&generated, &reference).into_parts();

    assert_eq!(
        errors,
        vec![
            "Pumps: 2 generated but 3 reference objects; unmatched reference ids: \
             Pump 2, Pump 1, Pump 3"
                .to_string()
        ]
    );
    assert_eq!(map.get("P-x"), None);
    assert_eq!(map.get("B-1"), Some("Boiler"));
}

#[test]
fn custom_layouts_are_configurable() {
    let mut config = Config::default();
    config.set_zone_paths(&["$.spaces[*]"]);
    config.set_category("Fans", &["$.spaces[*].fans[*]"]);

    let generated = json!({"spaces": [
        {"id": "Office", "fans": [{"id": "EF-1"}]},
        {"id": "Lobby", "fans": [{"id": "EF-2"}]},
    ]});
    let reference = json!({"spaces": [
        {"id": "Lobby Space", "fans": [{"id": "Exhaust B"}]},
        {"id": "Office Space", "fans": [{"id": "Exhaust A"}]},
    ]});

    let outcome = map_objects_with(&generated, &reference, &config).unwrap();

    assert!(!outcome.has_errors(), "{:?}", outcome.errors());
    assert!(outcome.warnings().is_empty(), "{:?}", outcome.warnings());
    assert_eq!(outcome.map.get("Office"), Some("Office Space"));
    assert_eq!(outcome.map.get("EF-1"), Some("Exhaust A"));
    assert_eq!(outcome.map.get("EF-2"), Some("Exhaust B"));
}

#[test]
fn an_unreadable_zone_fails_the_zone_stage() {
    let generated = rpd(
        json!([
            {"id": "Room 1"},
            {"id": "Room 2", "surfaces": [{"id": "R2-S", "azimuth": "90"}]},
        ]),
        json!([]),
        json!({}),
    );
    let reference = rpd(
        json!([
            {"id": "Zone 1"},
            {"id": "Zone 2", "surfaces": [{"id": 7}]},
        ]),
        json!([]),
        json!({}),
    );

    let (map, warnings, errors) = map_objects(&generated, &reference).into_parts();

    assert!(map.is_empty(), "{map:?}");
    assert!(warnings.is_empty());
    assert_eq!(
        errors,
        vec![
            "Zones: unreadable objects in the generated document: Room 2; unmatched reference \
             ids: Zone 1, Zone 2"
                .to_string()
        ]
    );
}

#[test]
fn excessive_fingerprint_precision_is_a_configuration_error() {
    let mut config = Config::default();
    config.set_fingerprint_decimals(19);

    let error = map_objects_with(&exterior_zones(), &exterior_zones(), &config).unwrap_err();

    assert_eq!(error.to_string(), "fingerprint_decimals must be at most 9, got 19");
}
