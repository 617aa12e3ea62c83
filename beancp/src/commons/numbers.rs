use crate::executor::{BoxedConverter, Converter};

macro_rules! wraps {
    ($($ty:ty),+) => {
        vec![$(BoxedConverter::from(Converter::new(|value: &$ty| Some(*value))),)+]
    };
}

macro_rules! casts {
    ($($from:ty => $($to:ty),+;)+) => {
        vec![$($(BoxedConverter::from(Converter::new(|value: &$from| *value as $to)),)+)+]
    };
}

/// Converters between `i8`, `i16`, `i32`, `i64`, `f32` and `f64`, using `as`
/// semantics (truncation and saturation included), plus `P -> Option<P>` for
/// each of them.
pub fn number_converters() -> Vec<BoxedConverter> {
    let mut converters = wraps!(i8, i16, i32, i64, f32, f64);
    converters.extend(casts! {
        i8 => i16, i32, i64, f32, f64;
        i16 => i8, i32, i64, f32, f64;
        i32 => i8, i16, i64, f32, f64;
        i64 => i8, i16, i32, f32, f64;
        f32 => i8, i16, i32, i64, f64;
        f64 => i8, i16, i32, i64, f32;
    });
    converters
}
