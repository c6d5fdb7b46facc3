//! Namespaces and arrays shared by the view tests.

use std::io::Write;
use std::sync::Arc;

use mdim_common::{DataType, Dimension, DimensionKind, MdArray, MdimResult, MemArray, MemGroup};
use tempfile::NamedTempFile;

use crate::arrays::FunctionArray;

/// Size of the dimension of `/too_large_dim_ar`, one above the default
/// selector limit.
pub const TOO_LARGE_DIM_SIZE: u64 = 10 * 1024 * 1024 + 1;

/// A namespace with a `band` dimension indexed by `/band_properties/validity`.
///
/// ```text
/// /
/// ├── band (3, indexed by /band_properties/validity = [1, 0, 1])
/// ├── X (2, indexed by /X = [10, 20]), Y (2), too_large_dim
/// ├── X, ar [band, Y, X] = 0..12, non_numeric_ar, too_large_dim_ar, same_value [X] = [10, 10]
/// ├── band_properties/validity [band]
/// └── subgroup/indexed_twice_by_band [band, X, band] = 0..18
/// ```
///
/// `ar` has unit `foo`, NoData 5 and spatial reference `EPSG:4326`.
pub fn subset_namespace() -> MdimResult<Arc<MemGroup>> {
    let root = MemGroup::new_root();
    let band_properties = root.create_group("band_properties")?;

    let plain_band = root.create_dimension("band", DimensionKind::Other, 3)?;
    let validity = band_properties.create_array("validity", vec![plain_band], DataType::Int32)?;
    validity.write(&[1.0, 0.0, 1.0])?;
    let band = root.set_indexing_variable("band", validity)?;

    let plain_x = root.create_dimension("X", DimensionKind::HorizontalX, 2)?;
    let x = root.create_array("X", vec![plain_x], DataType::Float64)?;
    x.write(&[10.0, 20.0])?;
    let dim_x = root.set_indexing_variable("X", x)?;

    let dim_y = root.create_dimension("Y", DimensionKind::HorizontalY, 2)?;

    let values: Vec<f64> = (0..12).map(f64::from).collect();
    let ar = MemArray::from_values(
        root.child_path("ar"),
        vec![band.clone(), dim_y, dim_x.clone()],
        DataType::Float64,
        &values,
    )?
    .with_unit("foo")
    .with_no_data(5.0)
    .with_spatial_ref("EPSG:4326");
    root.add_array(Arc::new(ar))?;

    let subgroup = root.create_group("subgroup")?;
    let twice = subgroup.create_array(
        "indexed_twice_by_band",
        vec![band.clone(), dim_x.clone(), band.clone()],
        DataType::Float64,
    )?;
    let values: Vec<f64> = (0..18).map(f64::from).collect();
    twice.write(&values)?;

    root.create_array("non_numeric_ar", vec![band], DataType::String)?;

    let too_large = root.create_dimension("too_large_dim", DimensionKind::Other, TOO_LARGE_DIM_SIZE)?;
    root.add_array(Arc::new(FunctionArray::constant(
        root.child_path("too_large_dim_ar"),
        vec![too_large],
        DataType::UInt8,
        0.0,
    )))?;

    let same_value = root.create_array("same_value", vec![dim_x], DataType::Float64)?;
    same_value.write(&[10.0, 10.0])?;

    Ok(root)
}

/// Six points on a 3 × 2 lattice with two value slices.
#[derive(Debug, Clone)]
pub struct PointCloud {
    pub root: Arc<MemGroup>,
    /// `[other(2), node(6)]`: `[1..=6]` then `[20, 30, 20, 30, 20, 30]`.
    pub values: Arc<dyn MdArray>,
    /// `[0, 0, 1, 1, 2, 2]`
    pub x: Arc<dyn MdArray>,
    /// `[0, 1, 0, 1, 0, 1]`
    pub y: Arc<dyn MdArray>,
}

/// Build the six-point cloud under `/other`, `/node`, `/varX`, `/varY`, `/ar`.
///
/// `/ar` has unit `foo` and spatial reference `EPSG:4326`.
pub fn point_cloud() -> MdimResult<PointCloud> {
    let root = MemGroup::new_root();
    let other = root.create_dimension("other", DimensionKind::Other, 2)?;
    let node = root.create_dimension("node", DimensionKind::Other, 6)?;

    let x = root.create_array("varX", vec![node.clone()], DataType::Float64)?;
    x.write(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0])?;
    let y = root.create_array("varY", vec![node.clone()], DataType::Float64)?;
    y.write(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0])?;

    let values = MemArray::from_values(
        root.child_path("ar"),
        vec![other, node],
        DataType::Float64,
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 20.0, 30.0, 20.0, 30.0, 20.0, 30.0],
    )?
    .with_unit("foo")
    .with_spatial_ref("EPSG:4326");
    let values: Arc<dyn MdArray> = Arc::new(values);
    root.add_array(values.clone())?;

    let x: Arc<dyn MdArray> = x;
    let y: Arc<dyn MdArray> = y;
    Ok(PointCloud {
        root,
        values,
        x,
        y,
    })
}

/// Build a pair of `Int32` lookup arrays of shape `[rows, cols]`.
///
/// Returns `(index_x, index_y)`.
pub fn glt_pair(
    rows: u64,
    cols: u64,
    index_x: &[f64],
    index_y: &[f64],
) -> MdimResult<(Arc<dyn MdArray>, Arc<dyn MdArray>)> {
    let y = Arc::new(Dimension::new("/glt_y", DimensionKind::HorizontalY, rows));
    let x = Arc::new(Dimension::new("/glt_x", DimensionKind::HorizontalX, cols));
    let gx: Arc<dyn MdArray> = Arc::new(MemArray::from_values(
        "/glt_index_x",
        vec![y.clone(), x.clone()],
        DataType::Int32,
        index_x,
    )?);
    let gy: Arc<dyn MdArray> = Arc::new(MemArray::from_values(
        "/glt_index_y",
        vec![y, x],
        DataType::Int32,
        index_y,
    )?);
    Ok((gx, gy))
}

/// Write a dataset description to a temporary `.json` file.
pub fn dataset_file(json: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdim_common::Group;

    #[test]
    fn test_subset_namespace_layout() {
        let root = subset_namespace().unwrap();
        assert_eq!(root.dimensions().len(), 4);
        assert_eq!(root.group_names(), vec!["band_properties", "subgroup"]);
        let ar = root.open_array("ar").unwrap();
        assert_eq!(ar.shape(), vec![3, 2, 2]);
        let band = &ar.dimensions()[0];
        assert_eq!(
            band.indexing_variable().unwrap().full_name(),
            "/band_properties/validity"
        );
        let too_large = root.open_array("too_large_dim_ar").unwrap();
        assert_eq!(too_large.total_elements(), TOO_LARGE_DIM_SIZE);
    }

    #[test]
    fn test_point_cloud() {
        let cloud = point_cloud().unwrap();
        assert_eq!(cloud.values.shape(), vec![2, 6]);
        assert!(cloud.x.dimensions()[0].same_axis(&cloud.values.dimensions()[1]));
        assert_eq!(cloud.root.array_names(), vec!["varX", "varY", "ar"]);
    }

    #[test]
    fn test_dataset_file() {
        let file = dataset_file("{}").unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "{}");
    }
}
