//! Named-axis array container
//!
//! [`VarArray`] stores an n-dimensional `f64` field as a flat `Vec<f64>` in
//! row-major order together with the names and lengths of its axes. All chunk
//! slicing and recombination in the engine goes through this type.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Axis;
use crate::error::{Result, WakeError};

/// Flat row-major array with named axes
///
/// The last axis is contiguous in memory. A `(State, Turbine)` array stores
/// turbine values of state `s` at `s * n_turbines .. (s + 1) * n_turbines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarArray {
    dims: Vec<Axis>,
    shape: Vec<usize>,
    /// Values travel as raw bit patterns so NaN placeholders survive transfer
    #[serde(with = "f64_bits")]
    data: Vec<f64>,
}

impl VarArray {
    /// Create an array from raw data
    ///
    /// # Arguments
    ///
    /// * `dims` - Axis names, outermost first
    /// * `shape` - Axis lengths, same order as `dims`
    /// * `data` - Values in row-major order
    ///
    /// # Returns
    ///
    /// The array, or `ShapeMismatch` if `data` does not fill `shape` exactly
    pub fn new(dims: &[Axis], shape: &[usize], data: Vec<f64>) -> Result<Self> {
        if dims.len() != shape.len() {
            return Err(WakeError::InvalidConfig(format!(
                "array dims {dims:?} do not match shape {shape:?}"
            )));
        }
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(WakeError::shape_mismatch(
                "array data",
                &[expected],
                &[data.len()],
            ));
        }
        Ok(Self {
            dims: dims.to_vec(),
            shape: shape.to_vec(),
            data,
        })
    }

    /// 1D array over a single axis
    #[must_use]
    pub fn from_1d(axis: Axis, data: Vec<f64>) -> Self {
        Self {
            dims: vec![axis],
            shape: vec![data.len()],
            data,
        }
    }

    /// Create an array with every element set to `value`
    #[must_use]
    pub fn full(dims: &[Axis], shape: &[usize], value: f64) -> Self {
        debug_assert_eq!(dims.len(), shape.len());
        Self {
            dims: dims.to_vec(),
            shape: shape.to_vec(),
            data: vec![value; shape.iter().product()],
        }
    }

    /// Zero-filled array
    #[must_use]
    pub fn zeros(dims: &[Axis], shape: &[usize]) -> Self {
        Self::full(dims, shape, 0.0)
    }

    /// NaN-filled array, used as "not yet computed" placeholder
    #[must_use]
    pub fn nan(dims: &[Axis], shape: &[usize]) -> Self {
        Self::full(dims, shape, f64::NAN)
    }

    /// Axis names
    #[must_use]
    pub fn dims(&self) -> &[Axis] {
        &self.dims
    }

    /// Axis lengths
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the array holds no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of `axis` in this array's dims
    #[must_use]
    pub fn axis_index(&self, axis: Axis) -> Option<usize> {
        self.dims.iter().position(|&d| d == axis)
    }

    /// Length of `axis`, if the array has it
    #[must_use]
    pub fn size_of(&self, axis: Axis) -> Option<usize> {
        self.axis_index(axis).map(|k| self.shape[k])
    }

    /// Get reference to array data
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get mutable reference to array data
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the array, returning its data
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Fill entire array with a value
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// True if any element is NaN
    #[must_use]
    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|v| v.is_nan())
    }

    /// Element-wise bit equality, NaN compares equal to the same NaN
    #[must_use]
    pub fn bit_eq(&self, other: &VarArray) -> bool {
        self.dims == other.dims
            && self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    #[inline]
    fn index2(&self, i: usize, j: usize) -> usize {
        assert!(
            self.shape.len() == 2 && i < self.shape[0] && j < self.shape[1],
            "Index ({i}, {j}) out of bounds for shape {:?}",
            self.shape
        );
        i * self.shape[1] + j
    }

    #[inline]
    fn index3(&self, i: usize, j: usize, k: usize) -> usize {
        assert!(
            self.shape.len() == 3
                && i < self.shape[0]
                && j < self.shape[1]
                && k < self.shape[2],
            "Index ({i}, {j}, {k}) out of bounds for shape {:?}",
            self.shape
        );
        (i * self.shape[1] + j) * self.shape[2] + k
    }

    /// Value of a 1D array
    ///
    /// # Panics
    ///
    /// Panics if the array is not 1D or `i` is out of bounds
    #[must_use]
    pub fn get1(&self, i: usize) -> f64 {
        assert!(self.shape.len() == 1, "get1 on {}D array", self.shape.len());
        self.data[i]
    }

    /// Value at `(i, j)` of a 2D array
    ///
    /// # Panics
    ///
    /// Panics if the array is not 2D or indices are out of bounds
    #[must_use]
    pub fn get2(&self, i: usize, j: usize) -> f64 {
        self.data[self.index2(i, j)]
    }

    /// Set value at `(i, j)` of a 2D array
    ///
    /// # Panics
    ///
    /// Panics if the array is not 2D or indices are out of bounds
    pub fn set2(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.index2(i, j);
        self.data[idx] = value;
    }

    /// Value at `(i, j, k)` of a 3D array
    ///
    /// # Panics
    ///
    /// Panics if the array is not 3D or indices are out of bounds
    #[must_use]
    pub fn get3(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.index3(i, j, k)]
    }

    /// Set value at `(i, j, k)` of a 3D array
    ///
    /// # Panics
    ///
    /// Panics if the array is not 3D or indices are out of bounds
    pub fn set3(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let idx = self.index3(i, j, k);
        self.data[idx] = value;
    }

    /// Contiguous row `[i, j, ..]` of a 3D array
    #[must_use]
    pub fn row3(&self, i: usize, j: usize) -> &[f64] {
        let start = self.index3(i, j, 0);
        &self.data[start..start + self.shape[2]]
    }

    /// Mutable contiguous row `[i, j, ..]` of a 3D array
    pub fn row3_mut(&mut self, i: usize, j: usize) -> &mut [f64] {
        let start = self.index3(i, j, 0);
        let n = self.shape[2];
        &mut self.data[start..start + n]
    }

    /// Outer block count, axis length and inner block length around axis `k`
    fn blocks(&self, k: usize) -> (usize, usize, usize) {
        let outer = self.shape[..k].iter().product();
        let inner = self.shape[k + 1..].iter().product();
        (outer, self.shape[k], inner)
    }

    /// Select indices along an axis
    ///
    /// Arrays without `axis` are returned unchanged.
    ///
    /// # Arguments
    ///
    /// * `axis` - Axis to select along
    /// * `indices` - Indices to keep, in output order
    pub fn select(&self, axis: Axis, indices: &[usize]) -> Result<Self> {
        let Some(k) = self.axis_index(axis) else {
            return Ok(self.clone());
        };
        let (outer, n, inner) = self.blocks(k);
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(WakeError::shape_mismatch(
                format!("{axis} selection index {bad}"),
                &self.shape,
                &[bad + 1],
            ));
        }

        let mut data = Vec::with_capacity(outer * indices.len() * inner);
        for o in 0..outer {
            let base = o * n * inner;
            for &i in indices {
                let start = base + i * inner;
                data.extend_from_slice(&self.data[start..start + inner]);
            }
        }

        let mut shape = self.shape.clone();
        shape[k] = indices.len();
        Ok(Self {
            dims: self.dims.clone(),
            shape,
            data,
        })
    }

    /// Slice a contiguous range along an axis
    ///
    /// Arrays without `axis` are returned unchanged.
    pub fn slice_axis(&self, axis: Axis, range: Range<usize>) -> Result<Self> {
        let indices: Vec<usize> = range.collect();
        self.select(axis, &indices)
    }

    /// Concatenate arrays along an axis
    ///
    /// All parts must share dims and agree on every other axis length. Parts
    /// without `axis` must all be identical in shape and the first one is
    /// returned, matching variables that do not vary along the chunked axis.
    ///
    /// # Arguments
    ///
    /// * `parts` - Arrays in output order
    /// * `axis` - Axis to join along
    pub fn concat(parts: &[VarArray], axis: Axis) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Err(WakeError::EmptyAxis { axis });
        };
        let Some(k) = first.axis_index(axis) else {
            return Ok(first.clone());
        };

        let mut total = 0;
        for part in parts {
            let compatible = part.dims == first.dims
                && part
                    .shape
                    .iter()
                    .zip(&first.shape)
                    .enumerate()
                    .all(|(d, (a, b))| d == k || a == b);
            if !compatible {
                return Err(WakeError::shape_mismatch(
                    format!("{axis} concatenation part"),
                    &first.shape,
                    &part.shape,
                ));
            }
            total += part.shape[k];
        }

        let (outer, _, inner) = first.blocks(k);
        let mut data = Vec::with_capacity(outer * total * inner);
        for o in 0..outer {
            for part in parts {
                let block = part.shape[k] * inner;
                data.extend_from_slice(&part.data[o * block..(o + 1) * block]);
            }
        }

        let mut shape = first.shape.clone();
        shape[k] = total;
        Ok(Self {
            dims: first.dims.clone(),
            shape,
            data,
        })
    }
}

mod f64_bits {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(data.iter().map(|v| v.to_bits()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let bits = Vec::<u64>::deserialize(deserializer)?;
        Ok(bits.into_iter().map(f64::from_bits).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VarArray {
        // 3 states x 2 turbines, value = 10 * s + t
        let data = (0..3)
            .flat_map(|s| (0..2).map(move |t| f64::from(10 * s + t)))
            .collect();
        VarArray::new(&[Axis::State, Axis::Turbine], &[3, 2], data).unwrap()
    }

    #[test]
    fn test_array_creation() {
        let arr = VarArray::zeros(&[Axis::State, Axis::Turbine], &[4, 3]);
        assert_eq!(arr.len(), 12);
        assert_eq!(arr.size_of(Axis::Turbine), Some(3));
        assert_eq!(arr.size_of(Axis::Target), None);
        assert!(arr.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = VarArray::new(&[Axis::State], &[3], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, WakeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_get_set() {
        let mut arr = VarArray::zeros(&[Axis::State, Axis::Target, Axis::TPoint], &[2, 3, 4]);
        arr.set3(1, 2, 3, 7.5);
        assert_eq!(arr.get3(1, 2, 3), 7.5);
        assert_eq!(arr.as_slice()[23], 7.5);
        assert_eq!(arr.row3(1, 2)[3], 7.5);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let arr = sample();
        let _ = arr.get2(3, 0);
    }

    #[test]
    fn test_slice_axis() {
        let arr = sample();
        let sliced = arr.slice_axis(Axis::State, 1..3).unwrap();
        assert_eq!(sliced.shape(), &[2, 2]);
        assert_eq!(sliced.as_slice(), &[10.0, 11.0, 20.0, 21.0]);

        let turb = arr.slice_axis(Axis::Turbine, 1..2).unwrap();
        assert_eq!(turb.as_slice(), &[1.0, 11.0, 21.0]);

        let untouched = arr.slice_axis(Axis::Target, 0..1).unwrap();
        assert_eq!(untouched, arr);
    }

    #[test]
    fn test_select_reorders() {
        let arr = sample();
        let sel = arr.select(Axis::Turbine, &[1, 0]).unwrap();
        assert_eq!(sel.as_slice(), &[1.0, 0.0, 11.0, 10.0, 21.0, 20.0]);
        assert!(arr.select(Axis::State, &[3]).is_err());
    }

    #[test]
    fn test_concat_restores_slices() {
        let arr = sample();
        let parts = vec![
            arr.slice_axis(Axis::Turbine, 0..1).unwrap(),
            arr.slice_axis(Axis::Turbine, 1..2).unwrap(),
        ];
        let joined = VarArray::concat(&parts, Axis::Turbine).unwrap();
        assert!(joined.bit_eq(&arr));

        let states = vec![
            arr.slice_axis(Axis::State, 0..2).unwrap(),
            arr.slice_axis(Axis::State, 2..3).unwrap(),
        ];
        assert!(VarArray::concat(&states, Axis::State).unwrap().bit_eq(&arr));
    }

    #[test]
    fn test_concat_shape_mismatch() {
        let a = VarArray::zeros(&[Axis::State, Axis::Turbine], &[1, 2]);
        let b = VarArray::zeros(&[Axis::State, Axis::Turbine], &[1, 3]);
        let err = VarArray::concat(&[a, b], Axis::State).unwrap_err();
        assert!(matches!(err, WakeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_nan_survives_bincode() {
        let mut arr = VarArray::nan(&[Axis::State], &[2]);
        arr.as_mut_slice()[1] = 3.0;
        let bytes = bincode::serialize(&arr).unwrap();
        let back: VarArray = bincode::deserialize(&bytes).unwrap();
        assert!(back.bit_eq(&arr));
        assert!(back.get1(0).is_nan());
    }
}
