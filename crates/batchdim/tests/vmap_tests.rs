// vmap tests — batch dims hide physical dims, stack, and block layout queries

use batchdim::prelude::*;
use proptest::prelude::*;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn ones(dims: &[usize]) -> Tensor {
    Tensor::ones(dims, DType::F32).expect("failed to create tensor")
}

fn assert_layout_queries_fail(x: &BatchedTensor) {
    assert!(matches!(
        x.strides(),
        Err(Error::UnsupportedOnBatchedValue { op: "strides" })
    ));
    assert!(matches!(
        x.is_contiguous(),
        Err(Error::UnsupportedOnBatchedValue { op: "is_contiguous" })
    ));
    assert!(matches!(
        x.storage(),
        Err(Error::UnsupportedOnBatchedValue { op: "storage" })
    ));
    assert!(matches!(
        x.storage_offset(),
        Err(Error::UnsupportedOnBatchedValue {
            op: "storage_offset"
        })
    ));
}

// Single and stacked batch dims

#[test]
fn test_single_batch_dim() {
    init_tracing();
    let x = add_batch_dim(&ones(&[2, 3, 4]), 1, 1).unwrap();
    assert_eq!(x.dims(), &[2, 4]);
    assert_eq!(x.rank(), 2);
    assert_eq!(x.elem_count(), 8);
    assert_layout_queries_fail(&x);
}

#[test]
fn test_multiple_batch_dims() {
    init_tracing();
    let x = add_batch_dim(&ones(&[2, 3, 4]), 1, 1).unwrap();
    let x = add_batch_dim(&x, 2, 1).unwrap();
    assert_eq!(x.dims(), &[2]);
    assert_eq!(x.rank(), 1);
    assert_eq!(x.elem_count(), 2);
    assert_eq!(x.bdims(), &[BatchDim::new(1, 1), BatchDim::new(2, 2)]);
    assert_layout_queries_fail(&x);
}

#[test]
fn test_all_dims_batched_is_scalar() {
    let x = ones(&[2, 3]).add_batch_dim(0, 0).unwrap();
    let x = x.add_batch_dim(1, 0).unwrap();
    assert_eq!(x.rank(), 0);
    assert_eq!(x.elem_count(), 1);
    assert!(x.add_batch_dim(2, 0).is_err());
}

#[test]
fn test_zero_sized_logical_dim() {
    let x = ones(&[3, 0, 2]).add_batch_dim(7, 0).unwrap();
    assert_eq!(x.dims(), &[0, 2]);
    assert_eq!(x.elem_count(), 0);
    let y = ones(&[0, 5]).add_batch_dim(7, 0).unwrap();
    assert_eq!(y.dims(), &[5]);
    assert_eq!(y.elem_count(), 5);
}

// Errors

#[test]
fn test_out_of_range_dim() {
    init_tracing();
    let base = ones(&[2, 3, 4]);
    assert!(matches!(
        add_batch_dim(&base, 1, 3),
        Err(Error::InvalidDimension { dim: 3, rank: 3 })
    ));
    // The range shrinks with every level already attached.
    let x = base.add_batch_dim(1, 0).unwrap();
    assert!(matches!(
        x.add_batch_dim(2, 2),
        Err(Error::InvalidDimension { dim: 2, rank: 2 })
    ));
}

#[test]
fn test_duplicate_level() {
    init_tracing();
    let x = add_batch_dim(&ones(&[2, 3, 4]), 1, 0).unwrap();
    assert!(matches!(
        add_batch_dim(&x, 1, 1),
        Err(Error::DuplicateLevel { level: 1 })
    ));
}

#[test]
fn test_failed_query_leaves_view_usable() {
    let x = ones(&[2, 3, 4]).add_batch_dim(1, 1).unwrap();
    assert!(x.strides().is_err());
    assert!(x.storage().is_err());
    assert_eq!(x.dims(), &[2, 4]);
    let y = x.add_batch_dim(2, 0).unwrap();
    assert_eq!(y.dims(), &[4]);
}

// Plain tensors

#[test]
fn test_plain_tensor_layout_queries_succeed() {
    let base = ones(&[2, 3, 4]);
    assert!(!base.is_batched());
    assert!(base.bdims().is_empty());
    assert_eq!(base.strides().unwrap(), &[12, 4, 1]);
    assert!(base.is_contiguous().unwrap());
    assert_eq!(base.storage().unwrap().len(), 24);
    assert_eq!(base.storage_offset().unwrap(), 0);

    let narrowed = base.narrow(2, 1, 2).unwrap();
    assert_eq!(narrowed.storage_offset().unwrap(), 1);
    assert!(!narrowed.is_contiguous().unwrap());
}

#[test]
fn test_layout_queries_fail_on_non_contiguous_value() {
    let t = ones(&[2, 3, 4]).transpose(0, 2).unwrap();
    let x = t.add_batch_dim(3, 0).unwrap();
    assert_eq!(x.dims(), &[3, 2]);
    assert_layout_queries_fail(&x);
}

// Sharing

#[test]
fn test_add_batch_dim_shares_value() {
    let base = Tensor::from_f64_slice(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], (2, 3), DType::F64).unwrap();
    let x = base.add_batch_dim(1, 0).unwrap();
    let y = x.add_batch_dim(2, 0).unwrap();
    assert!(x.value().shares_storage(&base));
    assert!(y.value().shares_storage(&base));
    assert_eq!(y.value().id(), base.id());
    // The source view is untouched.
    assert_eq!(x.dims(), &[3]);
    assert_eq!(x.bdims().len(), 1);
    // The value still answers layout queries directly.
    assert_eq!(y.value().strides().unwrap(), &[3, 1]);
    assert_eq!(
        y.value().to_f64_vec().unwrap(),
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
    );
}

#[test]
fn test_add_batch_dim_through_trait_objects() {
    init_tracing();
    let base = ones(&[2, 3, 4]);
    let x = base.add_batch_dim(1, 0).unwrap();
    let sources: [&dyn Batchable; 2] = [&base, &x];

    let attached: Vec<BatchedTensor> = sources
        .iter()
        .map(|s| add_batch_dim(*s, 7, 0).unwrap())
        .collect();
    assert_eq!(attached[0].dims(), &[3, 4]);
    assert_eq!(attached[1].dims(), &[4]);
    assert_eq!(attached[1].levels().collect::<Vec<_>>(), vec![1, 7]);
    assert!(!sources[0].is_batched());
    assert!(sources[1].is_batched());
    assert!(attached.iter().all(|a| a.value().shares_storage(&base)));
}

// Huge but empty values

#[test]
fn test_hiding_zero_dim_rejects_overflowing_view() {
    init_tracing();
    let base = Tensor::ones((usize::MAX, 0, 2), DType::U8).unwrap();
    assert_eq!(base.elem_count(), 0);

    // Hiding the zero leaves [MAX, 2], whose element count does not fit.
    assert!(matches!(
        add_batch_dim(&base, 1, 1),
        Err(Error::ShapeOverflow { .. })
    ));
    assert!(matches!(
        make_batched(base.clone(), vec![BatchDim::new(1, 1)]),
        Err(Error::ShapeOverflow { .. })
    ));

    let x = add_batch_dim(&base, 1, 0).unwrap();
    assert_eq!(x.dims(), &[0, 2]);
    assert_eq!(x.elem_count(), 0);
    assert_eq!(x.batch_size(1), Some(usize::MAX));
}

#[test]
fn test_batched_tensor_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Tensor>();
    assert_send_sync::<BatchedTensor>();

    let x = ones(&[2, 3, 4]).add_batch_dim(1, 1).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let x = x.clone();
            std::thread::spawn(move || x.elem_count())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 8);
    }
}

// Level order

fn shape_and_two_dims() -> impl Strategy<Value = (Vec<usize>, usize, usize)> {
    prop::collection::vec(0usize..5, 2..6)
        .prop_flat_map(|dims| {
            let rank = dims.len();
            (Just(dims), 0..rank, 0..rank)
        })
        .prop_filter("dims must differ", |(_, p, q)| p != q)
}

/// Logical index of physical dim `target` once `removed` is hidden.
fn logical_after(target: usize, removed: usize) -> usize {
    if target > removed {
        target - 1
    } else {
        target
    }
}

proptest! {
    #[test]
    fn prop_level_order_does_not_change_shape((dims, p, q) in shape_and_two_dims()) {
        let base = ones(&dims);
        let pq = base.add_batch_dim(1, p).unwrap().add_batch_dim(2, logical_after(q, p)).unwrap();
        let qp = base.add_batch_dim(1, q).unwrap().add_batch_dim(2, logical_after(p, q)).unwrap();

        prop_assert_eq!(pq.elem_count(), qp.elem_count());
        prop_assert_eq!(pq.dims(), qp.dims());
        let expected = Shape::new(dims.clone()).without_dims(&[p, q]);
        prop_assert_eq!(pq.shape(), &expected);
        prop_assert_eq!(pq.elem_count(), expected.elem_count());
    }

    #[test]
    fn prop_each_level_drops_one_dim(
        dims in prop::collection::vec(1usize..4, 1..6),
        picks in prop::collection::vec(0usize..8, 1..6),
    ) {
        let base = ones(&dims);
        let mut current = base.add_batch_dim(0, picks[0] % dims.len()).unwrap();
        for (i, pick) in picks.iter().enumerate().skip(1) {
            if current.rank() == 0 {
                break;
            }
            let before = current.dims().to_vec();
            let dim = pick % current.rank();
            let next = current.add_batch_dim(i as i64, dim).unwrap();
            let mut expected = before;
            expected.remove(dim);
            prop_assert_eq!(next.dims(), expected.as_slice());
            current = next;
        }
        prop_assert_eq!(current.rank(), dims.len() - current.bdims().len());
    }
}
