//! Boolean-Shaped Flags
//!
//! Zero-value flags: presence alone carries the information. All of these
//! are combinable into multi-flag tokens like `-abc`.

use std::sync::Arc;

use crate::completion::record::Completion;
use crate::core::errors::CmdError;
use crate::core::output::Output;
use crate::core::processor::ExecuteData;
use crate::data::{ArgValue, Data};
use crate::input::{Input, InputBreaker};

use super::flag::FlagHandler;

/// Presence stores `true`; absence stores nothing.
pub struct BoolFlag {
    name: String,
    short: Option<char>,
    desc: String,
}

impl BoolFlag {
    pub fn new(name: impl Into<String>, short: Option<char>, desc: impl Into<String>) -> Arc<dyn FlagHandler> {
        Arc::new(Self {
            name: name.into(),
            short,
            desc: desc.into(),
        })
    }
}

impl FlagHandler for BoolFlag {
    fn name(&self) -> &str {
        &self.name
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn desc(&self) -> &str {
        &self.desc
    }

    fn combinable(&self) -> bool {
        true
    }

    fn execute_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        _input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        data.set(self.name.clone(), true);
        Ok(())
    }

    fn complete_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        _input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        data.set(self.name.clone(), true);
        Ok(None)
    }
}

/// Presence stores the supplied value; absence stores the type's zero.
pub struct BoolValueFlag<T: ArgValue> {
    name: String,
    short: Option<char>,
    desc: String,
    true_value: T,
}

impl<T: ArgValue> BoolValueFlag<T> {
    pub fn new(
        name: impl Into<String>,
        short: Option<char>,
        desc: impl Into<String>,
        true_value: T,
    ) -> Arc<dyn FlagHandler> {
        Arc::new(Self {
            name: name.into(),
            short,
            desc: desc.into(),
            true_value,
        })
    }
}

impl<T: ArgValue> FlagHandler for BoolValueFlag<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn desc(&self) -> &str {
        &self.desc
    }

    fn combinable(&self) -> bool {
        true
    }

    fn execute_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        _input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        data.set(self.name.clone(), self.true_value.clone());
        Ok(())
    }

    fn complete_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        _input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        data.set(self.name.clone(), self.true_value.clone());
        Ok(None)
    }

    fn post_scan(&self, data: &mut Data) {
        data.set(self.name.clone(), T::zero());
    }
}

/// Presence stores one value, absence the other.
pub struct BoolValuesFlag<T: ArgValue> {
    name: String,
    short: Option<char>,
    desc: String,
    true_value: T,
    false_value: T,
}

impl<T: ArgValue> BoolValuesFlag<T> {
    pub fn new(
        name: impl Into<String>,
        short: Option<char>,
        desc: impl Into<String>,
        true_value: T,
        false_value: T,
    ) -> Arc<dyn FlagHandler> {
        Arc::new(Self {
            name: name.into(),
            short,
            desc: desc.into(),
            true_value,
            false_value,
        })
    }
}

impl<T: ArgValue> FlagHandler for BoolValuesFlag<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn short(&self) -> Option<char> {
        self.short
    }

    fn desc(&self) -> &str {
        &self.desc
    }

    fn combinable(&self) -> bool {
        true
    }

    fn execute_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        _input: &mut Input,
        _output: &mut Output,
        data: &mut Data,
        _exec_data: &mut ExecuteData,
    ) -> Result<(), CmdError> {
        data.set(self.name.clone(), self.true_value.clone());
        Ok(())
    }

    fn complete_values(
        &self,
        _breakers: &[Arc<dyn InputBreaker>],
        _input: &mut Input,
        data: &mut Data,
    ) -> Result<Option<Completion>, CmdError> {
        data.set(self.name.clone(), self.true_value.clone());
        Ok(None)
    }

    fn post_scan(&self, data: &mut Data) {
        data.set(self.name.clone(), self.false_value.clone());
    }
}
