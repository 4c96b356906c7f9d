use std::sync::Arc;

use arrow::{
    array::{ArrayRef, AsArray, Float64Array, RecordBatch, StringArray},
    datatypes::Float64Type,
};
use rowselect::{
    ColumnBinding, ColumnPresets, Localizable, Localized, RangeQuery, Sample, Selector,
    SelectorRef, Table, UniqueElements, label_rows,
};

const ROWS: &[(f64, f64, f64, f64, &str)] = &[
    (5.1, 3.5, 1.4, 0.2, "Setosa"),
    (4.9, 3.0, 1.4, 0.2, "Setosa"),
    (4.7, 3.2, 1.3, 0.2, "Setosa"),
    (5.0, 3.6, 1.4, 0.2, "Setosa"),
    (7.0, 3.2, 4.7, 1.4, "Versicolor"),
    (6.4, 3.2, 4.5, 1.5, "Versicolor"),
    (5.5, 2.3, 4.0, 1.3, "Versicolor"),
    (5.7, 2.8, 4.5, 1.3, "Versicolor"),
    (6.3, 3.3, 6.0, 2.5, "Virginica"),
    (5.8, 2.7, 5.1, 1.9, "Virginica"),
    (7.1, 3.0, 5.9, 2.1, "Virginica"),
    (7.6, 3.0, 6.6, 2.1, "Virginica"),
];

fn iris() -> Table {
    let column = |f: fn(&(f64, f64, f64, f64, &str)) -> f64| {
        Arc::new(Float64Array::from(ROWS.iter().map(f).collect::<Vec<_>>())) as ArrayRef
    };
    let batch = RecordBatch::try_from_iter(vec![
        ("sepal.length", column(|r| r.0)),
        ("sepal.width", column(|r| r.1)),
        ("petal.length", column(|r| r.2)),
        ("petal.width", column(|r| r.3)),
        (
            "variety",
            Arc::new(StringArray::from(
                ROWS.iter().map(|r| r.4).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
    ])
    .unwrap();
    Table::new(batch).unwrap()
}

fn ids(selector: &impl Selector, table: &Table) -> Vec<u32> {
    selector.select_ids(table).unwrap().iter().collect()
}

// three ways of binding a range to a column
const SEPAL_LENGTH: Localized<RangeQuery> = Localized::from_static("sepal.length");

struct PetalLength;

impl ColumnBinding for PetalLength {
    const COLUMN: &'static str = "petal.length";
}

fn sepal_length() -> Localized<RangeQuery> {
    RangeQuery::localized("sepal.length").unwrap()
}

#[test]
fn box_selection_equals_complement_of_range() {
    let table = iris();
    let outside = SEPAL_LENGTH.range().max(5).build().unwrap().into_ref()
        | SEPAL_LENGTH.range().min(6).build().unwrap().into_ref();
    let inside = sepal_length().range().min(5).max(6).build().unwrap().into_ref();
    let complement = !&inside;

    assert_eq!(ids(&outside, &table), vec![1, 2, 4, 5, 8, 10, 11]);
    assert_eq!(ids(&outside, &table), ids(&complement, &table));
    assert_eq!(
        complement.as_query().unwrap().expr(),
        "~(((`sepal.length` >= 5) & (`sepal.length` < 6)))"
    );

    let selected = outside.select(&table).unwrap();
    let lengths = selected
        .column_by_name("sepal.length")
        .unwrap()
        .as_primitive::<Float64Type>();
    assert!(lengths.values().iter().all(|v| *v < 5.0 || *v >= 6.0));
}

#[test]
fn composed_samples_are_equal() {
    let table = iris();
    let outside: SelectorRef = SEPAL_LENGTH.range().max(5).build().unwrap().into_ref()
        | SEPAL_LENGTH.range().min(6).build().unwrap().into_ref();
    let sample = Sample::new(5).with_seed(0);

    let samplers = [
        Sample::builder(5).seed(0).base_selector(outside.clone()).build(),
        sample.with_base_selector(Some(outside.clone())),
        sample.compose_from(&outside),
        outside.compose_into(&sample),
        sample.clone() << outside.clone(),
        outside.clone() >> sample.clone(),
    ];
    let expected = samplers[0].select_ids(&table).unwrap();
    assert_eq!(expected.len(), 5);
    assert!(expected.is_subset(&outside.select_ids(&table).unwrap()));
    for sampler in &samplers {
        assert_eq!(sampler.select_ids(&table).unwrap(), expected);
        assert_eq!(
            sampler.select(&table).unwrap(),
            table.project(&expected).unwrap()
        );
    }
}

#[test]
fn second_instance_of_each_variety() {
    let table = iris();
    let unique = UniqueElements::new("variety").with_indexer(|_| 2);
    assert_eq!(ids(&unique, &table), vec![2, 6, 10]);

    let selected = unique.select(&table).unwrap();
    let varieties = selected.column_by_name("variety").unwrap().as_string::<i32>();
    assert_eq!(
        varieties.iter().flatten().collect::<Vec<_>>(),
        vec!["Setosa", "Versicolor", "Virginica"]
    );
}

#[test]
fn nominal_petal_length_labels() {
    let table = iris();
    let petal = RangeQuery::bound::<PetalLength>();
    let labels = label_rows(
        &table,
        [
            ("short_petal", petal.range().max(3).build().unwrap()),
            ("medium_petal", petal.range().min(3).max(6).build().unwrap()),
            ("long_petal", petal.range().min(6).build().unwrap()),
        ],
    )
    .unwrap();
    assert_eq!(labels.labeled_len(), table.num_rows());

    let table = table
        .with_column("petal.length.nominal", labels.to_string_array())
        .unwrap();
    let nominal = table
        .column_by_name("petal.length.nominal")
        .unwrap()
        .as_string::<i32>();
    assert_eq!(nominal.value(0), "short_petal");
    assert_eq!(nominal.value(9), "medium_petal");
    assert_eq!(nominal.value(10), "medium_petal");
    assert_eq!(nominal.value(8), "long_petal");
    assert_eq!(
        table.query_ids("`petal.length.nominal` == 'long_petal'").unwrap().len(),
        2
    );
}

#[test]
fn binding_mechanisms_are_interchangeable() {
    let table = iris();
    let presets = ColumnPresets::builder()
        .bind("petal", "petal.length")
        .build()
        .unwrap();
    let bindings = [
        RangeQuery::bound::<PetalLength>(),
        Localized::from_static("petal.length"),
        RangeQuery::localized("petal.length").unwrap(),
        presets.localized::<RangeQuery>("petal").unwrap(),
    ];

    let expected = bindings[0].range().min(4).max(5).build().unwrap();
    for binding in &bindings {
        let range = binding.range().min(4).max(5).build().unwrap();
        assert_eq!(range, expected);
        assert_eq!(ids(&range, &table), vec![4, 5, 6, 7]);
    }
}
