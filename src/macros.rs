macro_rules! impl_to_perf_string_on_to_string {
    ($($t:ty), *) => {
        $(
            impl ToPerfString for $t {
                fn to_perf_string(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

/// Builds `name=a;b;c...` from anything implementing ToPerfString. Empty slots are kept, so the
/// number of `;` only depends on the number of arguments.
macro_rules! perf_string {
    ($name:expr, $first:expr $(, $rest:expr)*) => {
        {
            let mut s = String::new();
            s.push_str(&format!("{}=", $name));
            s.push_str(&$first.to_perf_string());
            $(
                s.push(';');
                s.push_str(&$rest.to_perf_string());
            )*
            s
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::ToPerfString;

    #[test]
    fn test_perf_string_macro() {
        let none: Option<f64> = None;

        assert_eq!(&perf_string!("a", 1u32), "a=1");
        assert_eq!(&perf_string!("a", 1u32, none, none), "a=1;;");
        assert_eq!(
            &perf_string!("'b'", 2.5f64, Some(1i64), none, Some(0i64)),
            "'b'=2.5;1;;0"
        );
    }
}
