// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use boq_lite_core::{ElementId, QuantityBasis, RawMeasurementSource};
use boq_lite_takeoff::{
    BasisSource, ElementSnapshot, GroupKey, Presence, QuantityUpdate, Takeoff, TakeoffConfig,
    ValueSource,
};

const EXPORT: &str = r#"{
  "source": "export",
  "elements": [
    {
      "id": 1,
      "category": "Floors",
      "family": "Floor",
      "type_name": "CONC-200",
      "parameters": { "HOST_VOLUME_COMPUTED": 10 }
    },
    {
      "id": 2,
      "category": "Floors",
      "family": "Floor",
      "type_name": "Timber 22",
      "parameters": {
        "BOQ_IsPayItem": true,
        "BOQ_Code": "B-01",
        "BOQ_QtyOverride": 30
      }
    },
    {
      "id": 3,
      "category": "Floors",
      "family": "Floor",
      "type_name": "Timber 22",
      "parameters": {
        "BOQ_IsPayItem": true,
        "BOQ_Code": "B-01",
        "BOQ_QtyOverride": 20
      }
    },
    {
      "id": 4,
      "category": "Generic Models",
      "family": "Lump Sum",
      "parameters": {
        "BOQ_IsPayItem": true,
        "BOQ_Code": "B-01",
        "BOQ_QtyBasis": "COMP",
        "BOQ_AnalysisBasis": "AREA",
        "BOQ_UnitPrice": 1000,
        "BOQ_QtyValue": 1
      }
    },
    {
      "id": 5,
      "category": "Walls",
      "family": "Basic Wall",
      "type_name": "Generic 200",
      "parameters": { "BOQ_QtyOverride": 10 }
    },
    {
      "id": 6,
      "category": "Railings",
      "family": "Handrail",
      "measurements": { "length": 100 }
    }
  ]
}"#;

fn schedule_with_wall_area(area: f64) -> ElementSnapshot {
    let mut snapshot = ElementSnapshot::from_json_str(EXPORT).unwrap();
    snapshot.source = Some("schedule".into());
    let wall = snapshot
        .elements
        .iter_mut()
        .find(|e| e.id == ElementId(5))
        .unwrap();
    wall.parameters.insert(
        "BOQ_QtyOverride".into(),
        boq_lite_core::ParamValue::Number(area),
    );
    snapshot
}

fn takeoff() -> Takeoff {
    Takeoff::new(TakeoffConfig::default()).unwrap()
}

#[test]
fn concrete_floor_is_taken_off_by_volume() {
    let snapshot = ElementSnapshot::from_json_str(EXPORT).unwrap();
    let run = takeoff().run(&snapshot.elements, &RawMeasurementSource).unwrap();

    let slab = &run.resolutions[0];
    assert_eq!(slab.basis, QuantityBasis::Volume);
    assert_eq!(slab.basis_source, BasisSource::ConcreteOverride);
    assert_eq!(slab.value_source, ValueSource::Parameter);
    assert_eq!(slab.value, Some(0.2832));

    let floors = &run.table.categories[&GroupKey::category("Floors").unwrap()];
    assert_eq!(floors.count, 3);
    assert_relative_eq!(floors.volume, 0.28);
    assert_relative_eq!(floors.area, 50.0);
}

#[test]
fn geometry_feeds_length_when_no_parameter() {
    let snapshot = ElementSnapshot::from_json_str(EXPORT).unwrap();
    let run = takeoff().run(&snapshot.elements, &RawMeasurementSource).unwrap();

    let rail = &run.resolutions[5];
    assert_eq!(rail.basis, QuantityBasis::Length);
    assert_eq!(rail.value_source, ValueSource::Geometry);
    assert_eq!(rail.value, Some(30.48));
}

#[test]
fn lump_sum_is_priced_against_booked_area() {
    let snapshot = ElementSnapshot::from_json_str(EXPORT).unwrap();
    let run = takeoff().run(&snapshot.elements, &RawMeasurementSource).unwrap();

    assert_eq!(run.summary.pay_items, 3);
    assert_eq!(run.pricing.failed(), 0);
    let line = &run.pricing.lines[0];
    assert_eq!(line.element_id, ElementId(4));
    assert_eq!(line.analysis_basis, QuantityBasis::Area);
    assert_relative_eq!(line.contract_value, 1000.0);
    assert_relative_eq!(line.sum_qty, 50.0);
    assert_relative_eq!(line.effective_unit_price, 20.0);

    let b01 = &run.by_boq_code["B-01"];
    assert_eq!(b01.count, 3);
    assert_relative_eq!(b01.area, 50.0);
}

#[test]
fn small_deltas_pass_and_larger_ones_are_reported() {
    let takeoff = takeoff();
    let export = ElementSnapshot::from_json_str(EXPORT).unwrap();
    let a = takeoff.run(&export.elements, &RawMeasurementSource).unwrap();

    let close = schedule_with_wall_area(10.05);
    let b = takeoff.run(&close.elements, &RawMeasurementSource).unwrap();
    assert!(takeoff.cross_validate(&a, &b).is_clean());

    let far = schedule_with_wall_area(10.15);
    let c = takeoff.run(&far.elements, &RawMeasurementSource).unwrap();
    let report = takeoff.cross_validate(&a, &c);
    assert_eq!(report.findings.len(), 1);

    let finding = &report.findings[0];
    assert_eq!(finding.discrepancy.key, GroupKey::category("Walls").unwrap());
    assert!(finding.discrepancy.mismatches.area);
    assert!(!finding.discrepancy.mismatches.count);
    assert_eq!(finding.family_rows.len(), 1);
    assert_eq!(
        finding.family_rows[0].key,
        GroupKey::family("Walls", "Basic Wall").unwrap()
    );
    assert!(report.render_text().contains("Walls: area 10.00 vs 10.15 m²"));
}

#[test]
fn missing_category_is_reported_one_sided() {
    let takeoff = takeoff();
    let export = ElementSnapshot::from_json_str(EXPORT).unwrap();
    let mut schedule = export.clone();
    schedule.elements.retain(|e| e.category != "Railings");

    let a = takeoff.run(&export.elements, &RawMeasurementSource).unwrap();
    let b = takeoff.run(&schedule.elements, &RawMeasurementSource).unwrap();
    let report = takeoff.cross_validate(&a, &b);

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].discrepancy.presence, Presence::OnlyA);
    assert_eq!(report.findings[0].family_rows[0].presence, Presence::OnlyA);
}

#[test]
fn write_back_covers_every_element() {
    let snapshot = ElementSnapshot::from_json_str(EXPORT).unwrap();
    let run = takeoff().run(&snapshot.elements, &RawMeasurementSource).unwrap();
    let mut sink: Vec<QuantityUpdate> = Vec::new();
    run.write_back(&mut sink).unwrap();

    assert_eq!(sink.len(), snapshot.elements.len());
    let lump_sum = sink.iter().find(|u| u.element_id == ElementId(4)).unwrap();
    assert_eq!(lump_sum.basis, QuantityBasis::Comp);
    assert_eq!(lump_sum.value, None);
}

#[test]
fn run_serializes_to_json() {
    let snapshot = ElementSnapshot::from_json_str(EXPORT).unwrap();
    let run = takeoff().run(&snapshot.elements, &RawMeasurementSource).unwrap();
    let json = serde_json::to_value(&run).unwrap();
    assert!(json["table"]["families"]["Walls|Basic Wall"].is_object());
    assert_eq!(json["summary"]["elements"], 6);
}
