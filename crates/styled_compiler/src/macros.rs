//! Declarative builders for style descriptions.

/// Build a [`StyleDescription`](crate::StyleDescription).
///
/// Keys are string literals; a braced value is a nested description, anything else is
/// converted with `StyleValue::from`.
///
/// ```
/// use styled_compiler::style;
///
/// let button = style! {
///     "padding" => 8,
///     "backgroundColor" => "royalblue",
///     "&:hover" => { "opacity" => 0.9 },
///     "@media (max-width: 768px)" => { "padding" => 4 },
/// };
/// assert_eq!(button.len(), 4);
/// ```
#[macro_export]
macro_rules! style {
    (@entries $target:ident ;) => {};
    (@entries $target:ident ; $key:literal => { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $target.insert($key, $crate::StyleValue::Nested($crate::style!($($inner)*)));
        $crate::style!(@entries $target ; $($($rest)*)?);
    };
    (@entries $target:ident ; $key:literal => $value:expr $(, $($rest:tt)*)?) => {
        $target.insert($key, $crate::StyleValue::from($value));
        $crate::style!(@entries $target ; $($($rest)*)?);
    };
    () => {
        $crate::StyleDescription::new()
    };
    ($($body:tt)+) => {{
        let mut description = $crate::StyleDescription::new();
        $crate::style!(@entries description ; $($body)+);
        description
    }};
}

/// Build [`KeyframeStops`](crate::KeyframeStops) from stop labels and declaration blocks.
///
/// ```
/// use styled_compiler::keyframes;
///
/// let fade = keyframes! {
///     "from" => { "opacity" => 0 },
///     "to" => { "opacity" => 1 },
/// };
/// assert_eq!(fade.len(), 2);
/// ```
#[macro_export]
macro_rules! keyframes {
    ($($label:literal => { $($body:tt)* }),* $(,)?) => {{
        let mut stops = $crate::KeyframeStops::new();
        $( stops.insert($label, $crate::style!($($body)*)); )*
        stops
    }};
}
