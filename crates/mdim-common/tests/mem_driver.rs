//! Integration tests for the in-memory driver and windowed reads.

use std::sync::Arc;

use mdim_common::{
    alloc_bytes, decode_all, regular_dimension, DataType, DestBuffer, Dimension, DimensionKind,
    Group, GroupSpec, MdArray, MdimError, MemArray, MemGroup, Window,
};

const NESTED: &str = r#"{
    "dimensions": [
        { "name": "time", "size": 2, "kind": "temporal" },
        { "name": "y", "size": 2, "kind": "horizontal_y", "direction": "NORTH" },
        { "name": "x", "size": 3, "kind": "horizontal_x" }
    ],
    "arrays": [
        { "name": "temperature", "dimensions": ["/time", "/y", "/x"], "data_type": "float32",
          "values": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
          "no_data": -1, "unit": "K", "spatial_ref": "EPSG:4326" },
        { "name": "label", "dimensions": ["/x"], "data_type": "string" }
    ],
    "groups": [
        { "name": "forecast",
          "dimensions": [{ "name": "member", "size": 2 }],
          "groups": [
            { "name": "ensemble",
              "arrays": [
                { "name": "spread", "dimensions": ["/forecast/member", "/x"],
                  "data_type": "uint8", "values": [1, 2, 3, 4, 5, 300] }
              ] }
          ] }
    ]
}"#;

fn nested() -> Arc<MemGroup> {
    GroupSpec::from_json(NESTED).unwrap().build().unwrap()
}

#[test]
fn test_nested_groups_from_json() {
    let root = nested();
    assert_eq!(root.full_name(), "/");
    assert_eq!(root.array_names(), vec!["temperature", "label"]);
    assert_eq!(root.group_names(), vec!["forecast"]);

    let forecast = root.open_group("forecast").unwrap();
    assert_eq!(forecast.full_name(), "/forecast");
    let member = &forecast.dimensions()[0];
    assert_eq!(member.full_name(), "/forecast/member");

    let spread = root
        .open_array_from_full_name("/forecast/ensemble/spread")
        .unwrap();
    assert_eq!(spread.name(), "spread");
    assert_eq!(spread.shape(), vec![2, 3]);
    // Out of range values saturate
    assert_eq!(
        spread.read_all_f64().unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 255.0]
    );
}

#[test]
fn test_metadata_from_json() {
    let root = nested();
    let temperature = root.open_array("temperature").unwrap();
    assert_eq!(temperature.data_type(), DataType::Float32);
    assert_eq!(temperature.raw_no_data(), Some(-1.0));
    assert_eq!(temperature.unit(), Some("K"));
    assert_eq!(temperature.spatial_ref(), Some("EPSG:4326"));
    assert_eq!(temperature.block_size(), vec![0, 0, 0]);

    let kinds: Vec<DimensionKind> = temperature.dimensions().iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            DimensionKind::Temporal,
            DimensionKind::HorizontalY,
            DimensionKind::HorizontalX
        ]
    );
}

#[test]
fn test_lookup_errors() {
    let root = nested();
    let err = root.open_array_from_full_name("/forecast/nope/spread").unwrap_err();
    assert_eq!(err.to_string(), "Cannot find array /forecast/nope/spread");
    assert!(err.is_validation());

    let err = root.open_group("nope").unwrap_err();
    assert_eq!(err.to_string(), "Group nope does not exist");

    let err = root.create_group("forecast").unwrap_err();
    assert_eq!(err.to_string(), "Group forecast already exists");

    let err = GroupSpec::from_json("[1, 2]").unwrap_err();
    assert!(matches!(err, MdimError::InvalidArgument(_)));
}

#[test]
fn test_non_numeric_array_cannot_be_read() {
    let root = nested();
    let label = root.open_array("label").unwrap();
    let err = label.read_all_f64().unwrap_err();
    assert!(matches!(err, MdimError::NotSupported(_)));
    assert_eq!(err.to_string(), "Array /label is not of numeric type");
}

#[test]
fn test_strided_window_reads() {
    let root = nested();
    let temperature = root.open_array("temperature").unwrap();

    // Second time step, every other column, rows reversed
    let window = Window::new(vec![1, 1, 0], vec![1, 2, 2], vec![1, -1, 2]);
    assert_eq!(
        temperature.read_f64(&window).unwrap(),
        vec![9.0, 11.0, 6.0, 8.0]
    );

    let err = temperature
        .read_f64(&Window::new(vec![0, 0, 0], vec![1, 1, 4], vec![1, 1, 1]))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_transposed_destination() {
    let values: Vec<f64> = (0..6).map(f64::from).collect();
    let dims = vec![
        Arc::new(Dimension::new("/r", DimensionKind::Other, 2)),
        Arc::new(Dimension::new("/c", DimensionKind::Other, 3)),
    ];
    let array = MemArray::from_values("/m", dims, DataType::Int16, &values).unwrap();

    let mut bytes = alloc_bytes(6 * DataType::Float64.size_bytes()).unwrap();
    {
        let mut dest = DestBuffer::new(&mut bytes, DataType::Float64, vec![1, 2]).unwrap();
        array.read(&Window::full(&[2, 3]), &mut dest).unwrap();
    }
    assert_eq!(
        decode_all(DataType::Float64, &bytes),
        vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]
    );
}

#[test]
fn test_destination_overflow_is_an_error() {
    let array = MemArray::from_values(
        "/v",
        vec![Arc::new(Dimension::new("/n", DimensionKind::Other, 4))],
        DataType::Float64,
        &[1.0, 2.0, 3.0, 4.0],
    )
    .unwrap();
    let mut bytes = vec![0u8; 2 * 8];
    let mut dest = DestBuffer::packed(&mut bytes, DataType::Float64, &[4]).unwrap();
    let err = array.read(&Window::full(&[4]), &mut dest).unwrap_err();
    assert!(matches!(err, MdimError::InvalidArgument(_)));
}

#[test]
fn test_indexing_variable_on_mem_group() {
    let root = MemGroup::new_root();
    let plain = root.create_dimension("lat", DimensionKind::HorizontalY, 3).unwrap();
    let lat = root
        .create_array("lat", vec![plain.clone()], DataType::Float64)
        .unwrap();
    lat.write(&[10.0, 20.0, 30.0]).unwrap();

    let indexed = root.set_indexing_variable("lat", lat).unwrap();
    assert!(plain.indexing_variable().is_none());
    assert_eq!(
        indexed.indexing_variable().unwrap().read_all_f64().unwrap(),
        vec![10.0, 20.0, 30.0]
    );
    assert!(root.dimensions()[0].indexing_variable().is_some());

    let err = root
        .set_indexing_variable("lon", Arc::new(MemArray::new("/lon", vec![], DataType::Float64)))
        .unwrap_err();
    assert_eq!(err.to_string(), "Dimension lon does not exist");
}

#[test]
fn test_regular_dimension_shared_between_arrays() {
    let x = regular_dimension("/x", DimensionKind::HorizontalX, 4, -1.5, 1.0);
    let a = MemArray::new("/a", vec![x.clone()], DataType::Float64);
    let b = MemArray::new("/b", vec![x.clone()], DataType::Int32);
    assert!(a.dimensions()[0].same_axis(&b.dimensions()[0]));
    assert_eq!(
        x.indexing_variable().unwrap().read_all_f64().unwrap(),
        vec![-1.5, -0.5, 0.5, 1.5]
    );
}

#[test]
fn test_concurrent_reads_and_writes() {
    let array = Arc::new(MemArray::new(
        "/shared",
        vec![Arc::new(Dimension::new("/n", DimensionKind::Other, 64))],
        DataType::Int32,
    ));
    std::thread::scope(|s| {
        for k in 0..4 {
            let array = array.clone();
            s.spawn(move || {
                array.write(&vec![k as f64; 64]).unwrap();
                let values = array.read_all_f64().unwrap();
                // Each read sees one complete write
                assert!(values.iter().all(|&v| v == values[0]));
            });
        }
    });
}
