use field_lineage::{
    run, CodePool, JsonFieldSource, LineageContext, LineageError, LineageOptions, LineageWarning,
    MatchMode, NodeGroup, RawDatasource, RawFieldRecord, Stage, POOL_CAPACITY,
};
use pretty_assertions::assert_eq;

fn region_sales_revenue() -> Vec<RawDatasource> {
    vec![
        RawDatasource::new("Parameters").with_field(
            RawFieldRecord::new("[P1]", "Region")
                .with_calculation("\"East\"")
                .with_datatype("string"),
        ),
        RawDatasource::new("federated.0x1")
            .with_caption("Orders")
            .with_field(
                RawFieldRecord::new("[Sales]", "Sales")
                    .with_datatype("real")
                    .used_in(["Sheet1"]),
            )
            .with_field(
                RawFieldRecord::new("[Rev]", "Revenue")
                    .with_calculation("SUM([Sales])")
                    .with_datatype("real")
                    .used_in(["Sheet1"]),
            ),
    ]
}

#[test]
fn unused_parameter_is_summarized_but_not_graphed() {
    let result = run(&region_sales_revenue(), &LineageOptions::default()).unwrap();

    let summary: Vec<(&str, &str, &str)> = result
        .summary
        .rows()
        .iter()
        .map(|r| (r.field_name.as_str(), r.kind, r.used_in_report))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Sales", "Default_Field", "Yes"),
            ("Region", "Parameters", "No"),
            ("Revenue", "Calculated_Field", "Yes"),
        ]
    );

    let nodes: Vec<(&str, &str, NodeGroup)> = result
        .graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.label.as_str(), n.group))
        .collect();
    assert_eq!(
        nodes,
        vec![
            ("AA", "Sales", NodeGroup::Default),
            ("x___AA", "Revenue", NodeGroup::Calculated),
        ]
    );

    let edges: Vec<(&str, &str)> = result
        .graph
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(edges, vec![("AA", "x___AA")]);
    assert_eq!(
        result.graph.node("x___AA").unwrap().title,
        "Revenue\n\nFormula:\nSUM([Sales])"
    );
}

#[test]
fn duplicate_display_names_get_numeric_suffixes() {
    let ds = RawDatasource::new("Orders")
        .with_field(
            RawFieldRecord::new("[Calculation_1]", "Index")
                .with_calculation("INDEX()")
                .used_in(["Sheet1"]),
        )
        .with_field(
            RawFieldRecord::new("[Calculation_2]", "Index!")
                .with_calculation("INDEX() + 1")
                .used_in(["Sheet2"]),
        );
    let result = run(&vec![ds], &LineageOptions::default()).unwrap();
    let labels: Vec<&str> = result.graph.nodes.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, vec!["Index", "Index1"]);
}

#[test]
fn too_many_used_default_fields_fail_allocation() {
    let mut ds = RawDatasource::new("Orders");
    for i in 0..700 {
        ds = ds.with_field(RawFieldRecord::new(format!("[F{i}]"), format!("F{i}")).used_in(["S"]));
    }
    let err = run(&vec![ds], &LineageOptions::default()).unwrap_err();
    assert_eq!(err.stage(), Stage::Allocation);
    match err {
        LineageError::IdentifierExhaustion {
            pool,
            required,
            capacity,
        } => {
            assert_eq!(pool, CodePool::Default);
            assert_eq!(required, 700);
            assert_eq!(capacity, POOL_CAPACITY);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn too_many_used_calculated_fields_fail_allocation() {
    let mut ds = RawDatasource::new("Orders");
    for i in 0..POOL_CAPACITY + 1 {
        ds = ds.with_field(
            RawFieldRecord::new(format!("[C{i}]"), format!("C{i}"))
                .with_calculation("1")
                .used_in(["S"]),
        );
    }
    let err = run(&vec![ds], &LineageOptions::default()).unwrap_err();
    assert_eq!(err.stage(), Stage::Allocation);
    match err {
        LineageError::IdentifierExhaustion {
            pool,
            required,
            capacity,
        } => {
            assert_eq!(pool, CodePool::Calculated);
            assert_eq!(required, 677);
            assert_eq!(capacity, POOL_CAPACITY);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn exactly_full_pool_is_accepted() {
    let mut ds = RawDatasource::new("Orders");
    for i in 0..POOL_CAPACITY {
        ds = ds.with_field(RawFieldRecord::new(format!("[F{i}]"), format!("F{i}")).used_in(["S"]));
    }
    let result = run(&vec![ds], &LineageOptions::default()).unwrap();
    assert_eq!(result.graph.nodes.len(), POOL_CAPACITY);
    assert_eq!(result.graph.nodes.last().unwrap().id.as_str(), "ZZ");
}

#[test]
fn unused_fields_do_not_count_against_capacity() {
    let mut ds = RawDatasource::new("Orders");
    for i in 0..700 {
        let record = RawFieldRecord::new(format!("[F{i}]"), format!("F{i}"));
        ds = ds.with_field(if i % 2 == 0 { record.used_in(["S"]) } else { record });
    }
    let result = run(&vec![ds], &LineageOptions::default()).unwrap();
    assert_eq!(result.graph.nodes.len(), 350);
    assert_eq!(result.summary.len(), 700);
}

#[test]
fn running_twice_gives_identical_output() {
    let source = region_sales_revenue();
    let mut ctx = LineageContext::new(LineageOptions::default());
    let first = ctx.run(&source).unwrap();
    let second = ctx.run(&source).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.graph.to_json_pretty().unwrap(),
        second.graph.to_json_pretty().unwrap()
    );
}

#[test]
fn malformed_document_fails_in_parse_stage() {
    let source = JsonFieldSource::from_text("{\"datasources\": 3}");
    let err = run(&source, &LineageOptions::default()).unwrap_err();
    assert_eq!(err.stage(), Stage::Parse);
    assert!(err.to_string().starts_with("parse stage failed"), "{err}");
}

#[test]
fn batch_mode_names_the_offending_field() {
    let ds = RawDatasource::new("Orders")
        .with_field(RawFieldRecord::new("[Sales]", "Sales").used_in(["Sheet1"]))
        .with_field(RawFieldRecord {
            id: Some("[Broken]".to_string()),
            ..RawFieldRecord::default()
        });
    let err = run(&vec![ds.clone()], &LineageOptions::default()).unwrap_err();
    assert_eq!(err.stage(), Stage::Extraction);
    assert_eq!(err.field_id(), Some("[Broken]"));

    let result = run(&vec![ds], &LineageOptions::interactive()).unwrap();
    assert_eq!(result.summary.len(), 1);
    assert!(matches!(
        result.warnings.as_slice(),
        [LineageWarning::SkippedField(_)]
    ));
}

#[test]
fn json_document_end_to_end() {
    let source = JsonFieldSource::from_text(
        r#"{
          "datasources": [
            {
              "name": "federated.0x1",
              "caption": "Superstore",
              "fields": [
                {"id": "[Profit]", "name": "Profit", "datatype": "real", "worksheets": ["Overview"]},
                {"id": "[Sales]", "name": "Sales", "datatype": "real", "worksheets": ["Overview"]},
                {
                  "id": "[Calculation_4211]",
                  "name": "Profit Ratio",
                  "datatype": "real",
                  "calculation": "SUM([Profit]) / SUM([Sales])",
                  "worksheets": ["Overview"]
                }
              ]
            }
          ]
        }"#,
    );
    let result = run(&source, &LineageOptions::default()).unwrap();
    let json = serde_json::to_value(&result.graph).unwrap();
    assert_eq!(
        json["edges"],
        serde_json::json!([
            {"from": "AA", "to": "x___AA", "arrows": "to"},
            {"from": "AB", "to": "x___AA", "arrows": "to"}
        ])
    );
    assert_eq!(json["nodes"][2]["label"], "Profit_Ratio");
    assert_eq!(result.summary.rows()[2].datasource, "Superstore");
}

#[test]
fn friendly_names_feed_the_summary_but_not_the_graph() {
    let ds = RawDatasource::new("Orders")
        .with_field(RawFieldRecord::new("[Sales]", "Sales").used_in(["Sheet1"]))
        .with_field(
            RawFieldRecord::new("[Calculation_1]", "Sales")
                .with_calculation("[Sales] * 2")
                .used_in(["Sheet1"]),
        )
        .with_field(
            RawFieldRecord::new("[Calculation_2]", "Quad")
                .with_calculation("[Calculation_1] * 2")
                .used_in(["Sheet1"]),
        );
    let result = run(&vec![ds], &LineageOptions::default()).unwrap();

    let quad = &result.summary.rows()[2];
    assert_eq!(quad.calculation, "[Sales] * 2");

    let edges: Vec<(&str, &str)> = result
        .graph
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(edges, vec![("AA", "x___AA"), ("x___AA", "x___AB")]);
}

#[test]
fn reference_mode_ignores_commented_references() {
    let ds = RawDatasource::new("Orders")
        .with_field(RawFieldRecord::new("[Sales]", "Sales").used_in(["Sheet1"]))
        .with_field(
            RawFieldRecord::new("[Calc]", "Calc")
                .with_calculation("1 // was [Sales]")
                .used_in(["Sheet1"]),
        );
    let options = LineageOptions {
        match_mode: MatchMode::Reference,
        ..LineageOptions::default()
    };
    let result = run(&vec![ds.clone()], &options).unwrap();
    assert!(result.graph.edges.is_empty());

    let result = run(&vec![ds], &LineageOptions::default()).unwrap();
    assert_eq!(result.graph.edges.len(), 1);
}

#[test]
fn custom_parameters_datasource() {
    let ds = RawDatasource::new("Params").with_field(
        RawFieldRecord::new("[Rate]", "Rate")
            .with_calculation("0.1")
            .used_in(["Sheet1"]),
    );
    let options = LineageOptions {
        parameters_datasource: "Params".to_string(),
        ..LineageOptions::default()
    };
    let result = run(&vec![ds], &options).unwrap();
    assert_eq!(result.summary.rows()[0].kind, "Parameters");
    assert_eq!(result.graph.nodes[0].title, "Parameter: Rate");
}
