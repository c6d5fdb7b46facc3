//! Integration tests for the orthorectified (GLT) view.

use std::sync::Arc;

use mdim_common::{
    decode_all, DataType, DestBuffer, Dimension, DimensionKind, MdArray, MdimError, MemArray, Window,
};
use test_utils::{glt_pair, index_raster_array, CountingArray, FailingArray};
use virtual_array::{create_orthorectified, GeoTransform, OrthorectifiedArray};

fn dim(name: &str, size: u64) -> Arc<Dimension> {
    Arc::new(Dimension::new(name, DimensionKind::Other, size))
}

fn raster_with_no_data(rows: u64, cols: u64, no_data: f64) -> Arc<dyn MdArray> {
    let values = test_utils::index_raster(rows as usize, cols as usize);
    Arc::new(
        MemArray::from_values("/p", vec![dim("/py", rows), dim("/px", cols)], DataType::Float64, &values)
            .unwrap()
            .with_no_data(no_data),
    )
}

#[test]
fn test_two_by_two_lookup_with_hole() {
    let parent: Arc<dyn MdArray> = Arc::new(
        MemArray::from_values(
            "/p",
            vec![dim("/py", 2), dim("/px", 2)],
            DataType::Int16,
            &[1.0, 2.0, 3.0, 4.0],
        )
        .unwrap()
        .with_no_data(-9999.0),
    );
    let (gx, gy) = glt_pair(2, 2, &[0.0, 1.0, 5.0, 0.0], &[0.0, 0.0, 0.0, 1.0]).unwrap();

    let view = create_orthorectified(parent, gx, gy, 0, GeoTransform::default()).unwrap();

    assert_eq!(view.shape(), vec![2, 2]);
    assert_eq!(view.data_type(), DataType::Int16);
    assert_eq!(view.raw_no_data(), Some(-9999.0));
    assert_eq!(view.read_all_f64().unwrap(), vec![1.0, 2.0, -9999.0, 3.0]);
}

#[test]
fn test_window_reads_only_bounding_rectangle() {
    let parent = CountingArray::new(index_raster_array("/p", 5, 5, DataType::Float64).unwrap());
    let ix: Vec<f64> = (0..9).map(|k| (k % 3 + 1) as f64).collect();
    let iy: Vec<f64> = (0..9).map(|k| (k / 3 + 2) as f64).collect();
    let (gx, gy) = glt_pair(3, 3, &ix, &iy).unwrap();
    let view = create_orthorectified(parent.clone(), gx, gy, 0, GeoTransform::default()).unwrap();

    let values = view
        .read_f64(&Window::contiguous(vec![1, 1], vec![2, 2]))
        .unwrap();
    assert_eq!(values, vec![3002.0, 3003.0, 4002.0, 4003.0]);

    assert_eq!(parent.read_count(), 1);
    assert_eq!(
        parent.windows(),
        vec![Window::contiguous(vec![3, 2], vec![2, 2])]
    );
}

#[test]
fn test_window_entirely_outside_skips_parent_read() {
    let parent = CountingArray::new(raster_with_no_data(3, 3, -1.0));
    let (gx, gy) = glt_pair(2, 2, &[7.0, 8.0, 9.0, 3.0], &[0.0, 0.0, 0.0, 0.0]).unwrap();
    let view = create_orthorectified(parent.clone(), gx, gy, 0, GeoTransform::default()).unwrap();

    assert_eq!(view.read_all_f64().unwrap(), vec![-1.0; 4]);
    assert_eq!(parent.read_count(), 0);
}

#[test]
fn test_offset_shifts_lookup() {
    let parent = index_raster_array("/p", 3, 3, DataType::Float64).unwrap();
    // One-based lookup table
    let (gx, gy) = glt_pair(1, 3, &[1.0, 2.0, 3.0], &[3.0, 2.0, 0.0]).unwrap();
    let view = create_orthorectified(parent, gx, gy, -1, GeoTransform::default()).unwrap();

    // Index 0 minus one is a hole; the parent has no NoData
    assert_eq!(view.read_all_f64().unwrap(), vec![2000.0, 1001.0, 0.0]);
    assert_eq!(view.raw_no_data(), None);
}

#[test]
fn test_extreme_offset_is_a_hole() {
    let parent = raster_with_no_data(2, 2, -5.0);
    let (gx, gy) = glt_pair(1, 2, &[0.0, 1.0], &[0.0, 1.0]).unwrap();
    let view = create_orthorectified(parent, gx, gy, i64::MAX, GeoTransform::default()).unwrap();
    assert_eq!(view.read_all_f64().unwrap(), vec![-5.0, -5.0]);
}

#[test]
fn test_trailing_dimension_carried_through() {
    let values: Vec<f64> = (0..2)
        .flat_map(|y| (0..3).flat_map(move |x| (0..2).map(move |b| (y * 100 + x * 10 + b) as f64)))
        .collect();
    let band = Arc::new(Dimension::new("/band", DimensionKind::Other, 2));
    let parent: Arc<dyn MdArray> = Arc::new(
        MemArray::from_values(
            "/cube",
            vec![dim("/py", 2), dim("/px", 3), band],
            DataType::Float64,
            &values,
        )
        .unwrap()
        .with_block_size(vec![1, 3, 2])
        .with_unit("K"),
    );
    let (gx, gy) = glt_pair(2, 2, &[2.0, 0.0, 1.0, 1.0], &[0.0, 1.0, 1.0, 0.0]).unwrap();
    let view = create_orthorectified(parent, gx, gy, 0, GeoTransform::default()).unwrap();

    let names: Vec<&str> = view.dimensions().iter().map(|d| d.full_name()).collect();
    assert_eq!(names, vec!["/Y", "/X", "/band"]);
    assert_eq!(view.block_size(), vec![256, 256, 2]);
    assert_eq!(view.unit(), Some("K"));

    assert_eq!(
        view.read_all_f64().unwrap(),
        vec![20.0, 21.0, 100.0, 101.0, 110.0, 111.0, 10.0, 11.0]
    );
    let reversed = view
        .read_f64(&Window::new(vec![0, 0, 1], vec![2, 2, 2], vec![1, 1, -1]))
        .unwrap();
    assert_eq!(
        reversed,
        vec![21.0, 20.0, 101.0, 100.0, 111.0, 110.0, 11.0, 10.0]
    );
}

#[test]
fn test_negative_steps_on_output_axes() {
    let parent = index_raster_array("/p", 2, 2, DataType::Float64).unwrap();
    let (gx, gy) = glt_pair(2, 2, &[0.0, 1.0, 0.0, 1.0], &[0.0, 0.0, 1.0, 1.0]).unwrap();
    let view = create_orthorectified(parent, gx, gy, 0, GeoTransform::default()).unwrap();

    let values = view
        .read_f64(&Window::new(vec![1, 1], vec![2, 2], vec![-1, -1]))
        .unwrap();
    assert_eq!(values, vec![1001.0, 1000.0, 1.0, 0.0]);
}

#[test]
fn test_converts_to_destination_type() {
    let parent = index_raster_array("/p", 1, 3, DataType::Float64).unwrap();
    let (gx, gy) = glt_pair(1, 3, &[2.0, 1.0, 0.0], &[0.0, 0.0, 0.0]).unwrap();
    let view = create_orthorectified(parent, gx, gy, 0, GeoTransform::default()).unwrap();

    let mut bytes = vec![0u8; 3];
    {
        let mut dest = DestBuffer::packed(&mut bytes, DataType::UInt8, &[1, 3]).unwrap();
        view.read(&Window::full(&[1, 3]), &mut dest).unwrap();
    }
    assert_eq!(decode_all(DataType::UInt8, &bytes), vec![2.0, 1.0, 0.0]);
}

#[test]
fn test_index_read_failure_propagates() {
    let parent = index_raster_array("/p", 2, 2, DataType::Float64).unwrap();
    let broken: Arc<dyn MdArray> = Arc::new(FailingArray::new(
        "/broken",
        vec![dim("/gy", 2), dim("/gx", 2)],
        DataType::Int32,
    ));
    let (_, gy) = glt_pair(2, 2, &[0.0; 4], &[0.0; 4]).unwrap();
    let view = create_orthorectified(parent, broken, gy, 0, GeoTransform::default()).unwrap();

    let err = view.read_all_f64().unwrap_err();
    assert!(matches!(err, MdimError::Read(_)));
}

#[test]
fn test_creation_validation() {
    let parent = index_raster_array("/p", 2, 2, DataType::Float64).unwrap();
    let (gx, _) = glt_pair(2, 2, &[0.0; 4], &[0.0; 4]).unwrap();
    let (_, gy_small) = glt_pair(1, 2, &[0.0; 2], &[0.0; 2]).unwrap();

    let err = OrthorectifiedArray::create(parent.clone(), gx.clone(), gy_small, 0, GeoTransform::default())
        .unwrap_err();
    assert!(err.is_validation());

    let flat: Arc<dyn MdArray> = Arc::new(
        MemArray::from_values("/flat", vec![dim("/n", 4)], DataType::Float64, &[0.0; 4]).unwrap(),
    );
    let err = OrthorectifiedArray::create(flat, gx.clone(), gx.clone(), 0, GeoTransform::default())
        .unwrap_err();
    assert!(err.is_validation());

    let text: Arc<dyn MdArray> = Arc::new(MemArray::new(
        "/text",
        vec![dim("/a", 2), dim("/b", 2)],
        DataType::String,
    ));
    let err = OrthorectifiedArray::create(text, gx.clone(), gx, 0, GeoTransform::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Array /text is not of numeric type");
}

#[test]
fn test_reads_are_repeatable_across_threads() {
    let parent = index_raster_array("/p", 4, 4, DataType::Float64).unwrap();
    let ix: Vec<f64> = (0..16).map(|k| (3 - k % 4) as f64).collect();
    let iy: Vec<f64> = (0..16).map(|k| (k / 4) as f64).collect();
    let (gx, gy) = glt_pair(4, 4, &ix, &iy).unwrap();
    let view = create_orthorectified(parent, gx, gy, 0, GeoTransform::default()).unwrap();

    let expected = view.read_all_f64().unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(view.read_all_f64().unwrap(), expected));
        }
    });
    assert_eq!(expected[0], 3.0);
    assert_eq!(expected[4], 1003.0);
}
