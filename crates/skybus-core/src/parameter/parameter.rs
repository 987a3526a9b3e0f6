//! Single-writer parameters with lock-free reads.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;

use crate::error::Error;
use crate::time::{SpacecraftElapsedTime, TimePoint};

/// Parameter identifier. Zero is reserved as [`INVALID_ID`].
pub type ParameterId = u32;

/// The reserved never-valid id.
pub const INVALID_ID: ParameterId = 0;

/// Value types storable in a [`Parameter`].
///
/// `Copy` is load-bearing: the whole `(value, timestamp)` snapshot moves
/// through one atomic cell, which is what makes reads tear-free without a
/// lock.
pub trait ParameterValue: Copy + Send + Sync + 'static {}

impl<T: Copy + Send + Sync + 'static> ParameterValue for T {}

#[derive(Clone, Copy)]
struct Snapshot<T> {
    value: T,
    timestamp: TimePoint<SpacecraftElapsedTime>,
}

/// A typed on-board parameter: `(id, value, timestamp)` with best-effort
/// single-writer semantics.
///
/// Writers race on an atomic flag: the loser is refused with
/// [`Error::ConcurrentWrite`] and the value is untouched. Readers never
/// block and always observe a consistent value/timestamp pair — either the
/// old snapshot or the new one, never a mix. This is deliberately *not* a
/// mutex; upgrading it to one would put an unbounded wait into the
/// telemetry read path.
pub struct Parameter<T: ParameterValue> {
    id: AtomicU32,
    snapshot: AtomicCell<Snapshot<T>>,
    write_in_progress: AtomicBool,
    initialized: AtomicBool,
    invalid_id_assigned: AtomicBool,
}

impl<T: ParameterValue + Default> Parameter<T> {
    /// An uninitialized parameter; every access except
    /// [`initialize`](Self::initialize) answers [`Error::NotInitialized`].
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: AtomicU32::new(INVALID_ID),
            snapshot: AtomicCell::new(Snapshot {
                value: T::default(),
                timestamp: TimePoint::start_of_epoch(),
            }),
            write_in_progress: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            invalid_id_assigned: AtomicBool::new(false),
        })
    }

    /// Shorthand for [`new`](Self::new) + [`initialize`](Self::initialize);
    /// an invalid id leaves the parameter uninitialized with the
    /// invalid-id flag set.
    pub fn with_value(
        id: ParameterId,
        value: T,
        timestamp: TimePoint<SpacecraftElapsedTime>,
    ) -> Arc<Self> {
        let parameter = Self::new();
        let _ = parameter.initialize(id, value, timestamp);
        parameter
    }
}

impl<T: ParameterValue> Parameter<T> {
    /// Assign id and initial value. Fails with [`Error::InvalidParameter`]
    /// for the reserved zero id.
    pub fn initialize(
        &self,
        id: ParameterId,
        value: T,
        timestamp: TimePoint<SpacecraftElapsedTime>,
    ) -> Result<(), Error> {
        if id == INVALID_ID {
            self.invalid_id_assigned.store(true, Ordering::SeqCst);
            return Err(Error::InvalidParameter);
        }
        self.id.store(id, Ordering::SeqCst);
        self.snapshot.store(Snapshot { value, timestamp });
        self.invalid_id_assigned.store(false, Ordering::SeqCst);
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Whether an initialization with the reserved id was attempted.
    pub fn has_invalid_id_assigned(&self) -> bool {
        self.invalid_id_assigned.load(Ordering::SeqCst)
    }

    /// The assigned id; [`INVALID_ID`] while uninitialized.
    pub fn id(&self) -> ParameterId {
        self.id.load(Ordering::SeqCst)
    }

    /// Read a consistent `(value, timestamp)` snapshot. Never blocks.
    pub fn get_value(&self) -> Result<(T, TimePoint<SpacecraftElapsedTime>), Error> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        let snapshot = self.snapshot.load();
        Ok((snapshot.value, snapshot.timestamp))
    }

    /// Store a new value and timestamp.
    ///
    /// A concurrent writer holding the write flag is refused with
    /// [`Error::ConcurrentWrite`]; the stored value stays untouched then.
    pub fn set_value(
        &self,
        value: T,
        timestamp: TimePoint<SpacecraftElapsedTime>,
    ) -> Result<(), Error> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        if self
            .write_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::ConcurrentWrite);
        }
        self.snapshot.store(Snapshot { value, timestamp });
        self.write_in_progress.store(false, Ordering::Release);
        Ok(())
    }
}

/// Type-erased view of a parameter, used by the store's index.
pub trait ErasedParameter: Send + Sync {
    fn id(&self) -> ParameterId;
    fn is_initialized(&self) -> bool;
    fn has_invalid_id_assigned(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn ErasedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedParameter").field("id", &self.id()).finish()
    }
}

impl<T: ParameterValue> ErasedParameter for Parameter<T> {
    fn id(&self) -> ParameterId {
        Parameter::id(self)
    }

    fn is_initialized(&self) -> bool {
        Parameter::is_initialized(self)
    }

    fn has_invalid_id_assigned(&self) -> bool {
        Parameter::has_invalid_id_assigned(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Anchored registration list, filled during component construction and
/// handed to [`ParameterStore::initialize`](crate::parameter::ParameterStore::initialize).
#[derive(Default)]
pub struct ParameterList {
    entries: Mutex<Vec<Arc<dyn ErasedParameter>>>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter in this list.
    pub fn add<T: ParameterValue>(&self, parameter: &Arc<Parameter<T>>) {
        self.entries
            .lock()
            .push(Arc::clone(parameter) as Arc<dyn ErasedParameter>);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn ErasedParameter>> {
        self.entries.lock().clone()
    }
}
