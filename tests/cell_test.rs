use memorder::{AtomicCell, MemoryOrder};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn cells_are_send_sync() {
    assert_send_sync::<AtomicCell<u8>>();
    assert_send_sync::<AtomicCell<i64>>();
    assert_send_sync::<AtomicCell<bool>>();
    assert_send_sync::<AtomicCell<*mut String>>();
}

#[test]
fn integer_cell_operations() {
    let cell = AtomicCell::new(5u64);
    assert_eq!(cell.load(MemoryOrder::Relax), 5);
    cell.store(7, MemoryOrder::Release);
    assert_eq!(cell.fetch_add(2, MemoryOrder::SeqCst), 7);
    assert_eq!(cell.sub_fetch(4, MemoryOrder::SeqCst), 5);
    assert_eq!(cell.swap(u64::MAX, MemoryOrder::Strong), 5);
    assert_eq!(cell.inc(MemoryOrder::SeqCst), 0);
    assert_eq!(cell.dec(MemoryOrder::SeqCst), u64::MAX);
    assert_eq!(cell.compare_and_swap(1, u64::MAX, MemoryOrder::Acquire), u64::MAX);
    assert_eq!(cell.xor_fetch(3, MemoryOrder::SeqCst), 2);
    assert_eq!(cell.fetch_or(4, MemoryOrder::SeqCst), 2);
    assert_eq!(cell.and_fetch(5, MemoryOrder::SeqCst), 4);
    assert_eq!(cell.into_inner(), 4);
}

#[test]
fn signed_cells_cross_zero() {
    let cell = AtomicCell::new(1i16);
    assert_eq!(cell.sub_fetch(3, MemoryOrder::SeqCst), -2);
    assert_eq!(cell.fetch_sub(i16::MAX, MemoryOrder::SeqCst), -2);
    assert_eq!(cell.load(MemoryOrder::SeqCst), (-2i16).wrapping_sub(i16::MAX));
    assert_eq!(cell.add_fetch(i16::MAX, MemoryOrder::SeqCst), -2);
}

#[test]
fn boolean_cell() {
    let flag = AtomicCell::new(false);
    assert!(!flag.swap(true, MemoryOrder::SeqCst));
    assert!(flag.compare_and_swap(false, true, MemoryOrder::SeqCst));
    assert!(!flag.load(MemoryOrder::Acquire));
    assert_eq!(unsafe { *flag.as_ptr() }, 0);

    flag.store(true, MemoryOrder::Release);
    assert_eq!(unsafe { *flag.as_ptr() }, 1);
}

#[test]
fn pointer_cell() {
    let mut value = String::from("runtime");
    let target: *mut String = &mut value;
    let cell = AtomicCell::new(core::ptr::null_mut::<String>());

    assert!(cell.compare_and_swap(target, core::ptr::null_mut(), MemoryOrder::SeqCst).is_null());
    let loaded = cell.load(MemoryOrder::Acquire);
    assert_eq!(loaded, target);
    assert_eq!(unsafe { &*loaded }, "runtime");
}

#[test]
fn from_ptr_shares_storage() {
    #[repr(align(8))]
    struct Slots([i64; 2]);

    let mut raw = Slots([0; 2]);
    let slot = unsafe { raw.0.as_mut_ptr().add(1) };
    let cell = unsafe { AtomicCell::<u64>::from_ptr(slot) };
    cell.store(u64::MAX, MemoryOrder::SeqCst);
    assert_eq!(cell.as_ptr(), slot);
    assert_eq!(raw.0, [0, -1]);
}

#[test]
fn exclusive_access_and_conversions() {
    let mut cell: AtomicCell<usize> = AtomicCell::default();
    assert_eq!(*cell.get_mut(), 0);
    cell.store(usize::MAX, MemoryOrder::Relax);
    assert_eq!(*cell.get_mut(), usize::MAX);
    *cell.get_mut() = 5;
    assert_eq!(cell.fetch_sub(1, MemoryOrder::SeqCst), 5);

    let from: AtomicCell<i8> = (-3).into();
    assert_eq!(format!("{from:?}"), "AtomicCell(-3)");
}

#[test]
fn generic_op_dispatch() {
    use memorder::backend::{Add, Xor};

    let cell = AtomicCell::new(10u32);
    assert_eq!(cell.fetch_op::<Add>(5, MemoryOrder::SeqCst), 10);
    assert_eq!(cell.op_fetch::<Xor>(15, MemoryOrder::SeqCst), 0);
}
