//! Id-indexed registry of parameters.

use std::sync::Arc;

use crate::error::Error;
use crate::parameter::parameter::{
    ErasedParameter, INVALID_ID, Parameter, ParameterId, ParameterList, ParameterValue,
};
use crate::time::{SpacecraftElapsedTime, TimePoint};

/// Validating, id-sorted index over one or more [`ParameterList`]s.
///
/// `initialize` ingests the lists once at startup; lookups afterwards are
/// binary searches. A failed initialization leaves the store unusable (and
/// re-initializable), never half-built.
pub struct ParameterStore {
    capacity: usize,
    index: Vec<Arc<dyn ErasedParameter>>,
    initialized: bool,
}

impl ParameterStore {
    /// A store accepting at most `capacity` parameters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            index: Vec::new(),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn number_of_parameters(&self) -> usize {
        self.index.len()
    }

    /// Validate and index every parameter of `lists`.
    ///
    /// Rejected with the specific defect: a parameter initialized with the
    /// reserved id ([`Error::InvalidParameter`]), a never-initialized
    /// parameter ([`Error::UninitializedParameter`]), two parameters
    /// sharing an id ([`Error::DuplicatedId`]), or more parameters than the
    /// store's capacity ([`Error::TooManyElements`]).
    pub fn initialize(&mut self, lists: &[&ParameterList]) -> Result<(), Error> {
        self.initialized = false;
        self.index.clear();

        let mut index: Vec<Arc<dyn ErasedParameter>> = Vec::new();
        for list in lists {
            index.extend(list.snapshot());
        }

        for parameter in &index {
            if parameter.has_invalid_id_assigned() {
                return Err(Error::InvalidParameter);
            }
            if !parameter.is_initialized() {
                return Err(Error::UninitializedParameter);
            }
        }

        if index.len() > self.capacity {
            return Err(Error::TooManyElements);
        }

        index.sort_by_key(|parameter| parameter.id());
        if index.windows(2).any(|pair| pair[0].id() == pair[1].id()) {
            return Err(Error::DuplicatedId);
        }

        log::debug!("parameter store initialized with {} parameters", index.len());
        self.index = index;
        self.initialized = true;
        Ok(())
    }

    /// Convenience for the single-list case.
    pub fn initialize_list(&mut self, list: &ParameterList) -> Result<(), Error> {
        self.initialize(&[list])
    }

    fn lookup(&self, id: ParameterId) -> Result<&Arc<dyn ErasedParameter>, Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if id == INVALID_ID {
            return Err(Error::InvalidParameter);
        }
        self.index
            .binary_search_by_key(&id, |parameter| parameter.id())
            .map(|position| &self.index[position])
            .map_err(|_| Error::NoSuchId)
    }

    /// The type-erased parameter registered under `id`.
    pub fn get_erased(&self, id: ParameterId) -> Result<&Arc<dyn ErasedParameter>, Error> {
        self.lookup(id)
    }

    /// The typed parameter registered under `id`; fails with
    /// [`Error::IncorrectType`] when `T` does not match the registered
    /// type.
    pub fn get_parameter<T: ParameterValue>(
        &self,
        id: ParameterId,
    ) -> Result<&Parameter<T>, Error> {
        self.lookup(id)?
            .as_any()
            .downcast_ref::<Parameter<T>>()
            .ok_or(Error::IncorrectType)
    }

    /// Read the `(value, timestamp)` snapshot of parameter `id`.
    pub fn get_value<T: ParameterValue>(
        &self,
        id: ParameterId,
    ) -> Result<(T, TimePoint<SpacecraftElapsedTime>), Error> {
        self.get_parameter::<T>(id)?.get_value()
    }

    /// Write parameter `id`; subject to the single-writer rule of
    /// [`Parameter::set_value`].
    pub fn set_value<T: ParameterValue>(
        &self,
        id: ParameterId,
        value: T,
        timestamp: TimePoint<SpacecraftElapsedTime>,
    ) -> Result<(), Error> {
        self.get_parameter::<T>(id)?.set_value(value, timestamp)
    }
}
