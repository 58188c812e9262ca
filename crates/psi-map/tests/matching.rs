use psi_map::{
    AutoMapOptions, AutoMapper, ConfidenceBand, FuzzyMatcher, MappingDocument, MatchMode,
    MatchReason, PropertyStatus,
};
use psi_model::{
    AssociationOrigin, PropertyCatalog, SourceColumn, VisibilityConfig, builtin_registry,
};

fn catalog(kind: &str) -> PropertyCatalog {
    builtin_registry()
        .unwrap()
        .require(kind)
        .unwrap()
        .catalog()
        .clone()
}

fn columns(names: &[&str]) -> Vec<SourceColumn> {
    names
        .iter()
        .map(|name| SourceColumn::new("buses.csv", *name))
        .collect()
}

#[test]
fn classification_is_symmetric_for_separator_headers() {
    let m = FuzzyMatcher::default();
    let forward = m.classify("BUS_NAME", "Name");
    let backward = m.classify("Name", "BUS_NAME");

    assert_eq!(forward.reason, MatchReason::EditDistance);
    assert_eq!(backward.reason, MatchReason::EditDistance);
    assert!((forward.score - 0.5).abs() < 1e-12);
    assert_eq!(forward.score, backward.score);
}

#[test]
fn normalized_tier_ignores_case_and_separators() {
    let m = FuzzyMatcher::default();
    let result = m.classify("nominal_voltage", "NominalVoltage");
    assert_eq!(result.reason, MatchReason::Normalized);
    assert_eq!(result.score, 0.96);
}

#[test]
fn empty_search_term_matches_everything() {
    let m = FuzzyMatcher::default();
    let fields = ["Manufacturer", "Style"];
    assert!(m.matches_any("", &fields, 0.9).unwrap());
    assert!(m.matches_any("  ", &fields, 0.9).unwrap());
    assert!(m.matches_any("style", &fields, 0.9).unwrap());
    assert!(!m.matches_any("Impedance", &fields, 0.9).unwrap());
    assert!(m.matches_any("style", &fields, 1.5).is_err());
}

#[test]
fn exact_headers_are_auto_accepted() {
    let catalog = catalog("Bus");
    let mut doc = MappingDocument::new("Plant A");
    let summary = AutoMapper::default().auto_map(
        &mut doc,
        &columns(&["Name", "Nominal Voltage"]),
        &catalog,
        &AutoMapOptions::default(),
    );

    let accepted: Vec<_> = summary
        .accepted
        .iter()
        .map(|p| p.property.name.as_str())
        .collect();
    assert!(accepted.contains(&"Name"));
    assert!(accepted.contains(&"NominalVoltage"));

    let name = doc.associations().get("Bus", "Name").unwrap();
    assert_eq!(name.column_header, "Name");
    assert!(name.required);
    assert_eq!(name.origin, AssociationOrigin::Auto);
    assert_eq!(
        doc.associations()
            .get("Bus", "NominalVoltage")
            .map(|a| a.column_header.as_str()),
        Some("Nominal Voltage")
    );
}

#[test]
fn second_run_is_idempotent() {
    let catalog = catalog("Bus");
    let cols = columns(&["Name", "Nominal Voltage", "Desc"]);
    let mapper = AutoMapper::default();
    let mut doc = MappingDocument::new("Plant A");

    mapper.auto_map(&mut doc, &cols, &catalog, &AutoMapOptions::default());
    let first = doc.associations().clone();
    let summary = mapper.auto_map(&mut doc, &cols, &catalog, &AutoMapOptions::default());

    assert_eq!(doc.associations(), &first);
    assert!(summary.accepted.is_empty());
    assert!(summary.replaced.is_empty());
    assert_eq!(summary.skipped.len(), first.len());
}

#[test]
fn manual_associations_survive_unless_reevaluated() {
    let catalog = catalog("Bus");
    let cols = columns(&["Name", "Nominal Voltage"]);
    let mapper = AutoMapper::default();
    let mut doc = MappingDocument::new("Plant A");
    doc.accept_manual(&catalog, "Name", "Bus ID").unwrap();

    let summary = mapper.auto_map(&mut doc, &cols, &catalog, &AutoMapOptions::default());
    assert!(summary.skipped.iter().any(|p| p == "Name"));
    assert_eq!(
        doc.status("Bus", "Name"),
        PropertyStatus::Mapped(AssociationOrigin::Manual)
    );

    let options = AutoMapOptions {
        reevaluate: true,
        ..AutoMapOptions::default()
    };
    let summary = mapper.auto_map(&mut doc, &cols, &catalog, &options);
    assert_eq!(summary.replaced.len(), 1);
    assert_eq!(summary.replaced[0].column_header, "Bus ID");
    assert_eq!(
        doc.associations()
            .get("Bus", "Name")
            .map(|a| a.column_header.as_str()),
        Some("Name")
    );
}

#[test]
fn weak_matches_become_suggestions_only() {
    let catalog = catalog("ArcFlash");
    let mapper = AutoMapper::default().with_mode(MatchMode::Tiered);
    let proposals = mapper.propose(
        &columns(&["Incident Energy (cal/cm2)"]),
        &catalog,
        &VisibilityConfig::default(),
    );
    let energy = proposals
        .iter()
        .find(|p| p.property.name == "IncidentEnergy")
        .unwrap();
    assert_eq!(energy.column_name(), Some("Incident Energy (cal/cm2)"));
    assert_ne!(energy.band, ConfidenceBand::NoMatch);

    let mut doc = MappingDocument::new("Plant A");
    let summary = mapper.auto_map(
        &mut doc,
        &columns(&["Incident Energy (cal/cm2)"]),
        &catalog,
        &AutoMapOptions::default(),
    );
    for proposal in &summary.suggested {
        assert!(doc.associations().get("ArcFlash", &proposal.property.name).is_none());
        assert_eq!(
            doc.status("ArcFlash", &proposal.property.name),
            PropertyStatus::Suggested
        );
    }
}

#[test]
fn hidden_properties_are_not_mapped() {
    let catalog = catalog("Bus");
    let options = AutoMapOptions {
        visibility: VisibilityConfig::new().hide_property("Bus", "Name"),
        ..AutoMapOptions::default()
    };
    let mut doc = MappingDocument::new("Plant A");
    AutoMapper::default().auto_map(&mut doc, &columns(&["Name"]), &catalog, &options);
    assert!(!doc.associations().contains("Bus", "Name"));
}
