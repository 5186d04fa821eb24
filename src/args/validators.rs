//! Validators
//!
//! A validator couples a check with the usage string shown in the
//! argument section. Failures surface as validation errors, which do not
//! trigger usage printing.

use std::fmt::Display;
use std::sync::Arc;

use regex_lite::Regex;

use crate::core::errors::CmdError;

pub struct Validator<T> {
    desc: String,
    #[allow(clippy::type_complexity)]
    check: Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>,
}

impl<T> Validator<T> {
    pub fn new<F>(desc: impl Into<String>, check: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            desc: desc.into(),
            check: Arc::new(check),
        }
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn validate(&self, arg_name: &str, value: &T) -> Result<(), CmdError> {
        (self.check)(value).map_err(|reason| CmdError::ValidationFailed {
            name: arg_name.to_string(),
            reason,
        })
    }
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self {
            desc: self.desc.clone(),
            check: self.check.clone(),
        }
    }
}

/// Value must equal one of the given options.
pub fn in_list<T>(options: Vec<T>) -> Validator<T>
where
    T: PartialEq + Display + Send + Sync + 'static,
{
    let rendered = options
        .iter()
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    Validator::new(format!("must be one of [{}]", rendered), move |v: &T| {
        if options.contains(v) {
            Ok(())
        } else {
            Err(format!("value must be one of [{}], got {}", rendered, v))
        }
    })
}

/// String must match every given pattern.
pub fn matches_regex(patterns: &[&str]) -> Validator<String> {
    let compiled: Vec<(String, Option<Regex>)> = patterns
        .iter()
        .map(|p| (p.to_string(), Regex::new(p).ok()))
        .collect();
    let desc = patterns
        .iter()
        .map(|p| format!("matches regex \"{}\"", p))
        .collect::<Vec<_>>()
        .join("; ");
    Validator::new(desc, move |v: &String| {
        for (pattern, regex) in &compiled {
            match regex {
                Some(r) if r.is_match(v) => {}
                Some(_) => return Err(format!("value does not match regex \"{}\"", pattern)),
                None => return Err(format!("invalid regex \"{}\"", pattern)),
            }
        }
        Ok(())
    })
}

pub fn min_length(n: usize) -> Validator<String> {
    Validator::new(format!("must be at least {} characters", n), move |v: &String| {
        if v.len() >= n {
            Ok(())
        } else {
            Err(format!("value must be at least {} characters, got {}", n, v.len()))
        }
    })
}

pub fn gte<T>(bound: T) -> Validator<T>
where
    T: PartialOrd + Display + Copy + Send + Sync + 'static,
{
    Validator::new(format!("must be >= {}", bound), move |v: &T| {
        if *v >= bound {
            Ok(())
        } else {
            Err(format!("value must be >= {}, got {}", bound, v))
        }
    })
}

pub fn lte<T>(bound: T) -> Validator<T>
where
    T: PartialOrd + Display + Copy + Send + Sync + 'static,
{
    Validator::new(format!("must be <= {}", bound), move |v: &T| {
        if *v <= bound {
            Ok(())
        } else {
            Err(format!("value must be <= {}, got {}", bound, v))
        }
    })
}

pub fn between<T>(lo: T, hi: T) -> Validator<T>
where
    T: PartialOrd + Display + Copy + Send + Sync + 'static,
{
    Validator::new(format!("must be in [{}, {}]", lo, hi), move |v: &T| {
        if *v >= lo && *v <= hi {
            Ok(())
        } else {
            Err(format!("value must be in [{}, {}], got {}", lo, hi, v))
        }
    })
}

/// Path must exist on the given filesystem.
pub fn file_exists(fs: Arc<dyn crate::fs::SyncFileSystem>) -> Validator<String> {
    Validator::new("must be an existing path", move |v: &String| {
        if fs.exists(v) {
            Ok(())
        } else {
            Err(format!("path \"{}\" does not exist", v))
        }
    })
}

/// Path must be a directory on the given filesystem.
pub fn is_dir(fs: Arc<dyn crate::fs::SyncFileSystem>) -> Validator<String> {
    Validator::new("must be a directory", move |v: &String| {
        match fs.stat(v) {
            Ok(stat) if stat.is_directory => Ok(()),
            Ok(_) => Err(format!("path \"{}\" is not a directory", v)),
            Err(_) => Err(format!("path \"{}\" does not exist", v)),
        }
    })
}

/// Every element of the list passes the inner validator.
pub fn for_each<T>(inner: Validator<T>) -> Validator<Vec<T>>
where
    T: Send + Sync + 'static,
{
    let desc = inner.desc().to_string();
    Validator::new(desc, move |values: &Vec<T>| {
        for v in values {
            (inner.check)(v)?;
        }
        Ok(())
    })
}

// ============================================================================
// Tests
// ============================================================================
