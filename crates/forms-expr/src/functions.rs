//! Whitelisted functions callable from formulas, and the clock they read.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde_json::Value;

use crate::error::EvalError;

/// Source of "today" for date functions.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Reads the local wall clock on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

type Callable = dyn Fn(&[Value], &dyn Clock) -> Result<Value, EvalError> + Send + Sync;

/// A named function with a fixed arity.
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub arity: usize,
    call: Arc<Callable>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, arity: usize, call: F) -> Self
    where
        F: Fn(&[Value], &dyn Clock) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            call: Arc::new(call),
        }
    }

    /// Checks arity, then invokes the function.
    pub fn call(&self, args: &[Value], clock: &dyn Clock) -> Result<Value, EvalError> {
        if args.len() != self.arity {
            return Err(EvalError::ArityMismatch {
                function: self.name.clone(),
                expected: self.arity,
                got: args.len(),
            });
        }
        (self.call)(args, clock)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// The set of functions a formula may call. Nothing outside the registry
/// is reachable.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Function>,
}

impl FunctionRegistry {
    /// A registry with no functions at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `calculateAge(date)` and `today()`.
    pub fn builtins() -> Self {
        let mut reg = Self::empty();
        reg.register(Function::new("calculateAge", 1, |args, clock| {
            calculate_age_value(&args[0], clock.today())
        }));
        reg.register(Function::new("today", 0, |_, clock| {
            Ok(Value::String(format_date(clock.today())))
        }));
        reg
    }

    /// Adds or replaces a function.
    pub fn register(&mut self, function: Function) {
        self.functions.insert(function.name.clone(), function);
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

/// Whole years from `birth` to `today`, minus one when this year's
/// birthday has not happened yet.
pub fn calculate_age(birth: NaiveDate, today: NaiveDate) -> i64 {
    let mut years = i64::from(today.year()) - i64::from(birth.year());
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

fn calculate_age_value(arg: &Value, today: NaiveDate) -> Result<Value, EvalError> {
    let text = match arg {
        Value::Null => return Ok(Value::from(0)),
        Value::String(s) if s.trim().is_empty() => return Ok(Value::from(0)),
        Value::String(s) => s.trim(),
        other => {
            return Err(EvalError::InvalidArgument {
                function: "calculateAge".into(),
                message: format!("expected a date string, got {}", crate::value::type_name(other)),
            });
        }
    };
    let birth = parse_date(text).ok_or_else(|| EvalError::InvalidArgument {
        function: "calculateAge".into(),
        message: format!("'{}' is not a date", text),
    })?;
    Ok(Value::from(calculate_age(birth, today)))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
