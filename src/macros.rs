/// Assert that two floating point numbers are equal within `eps`.
#[cfg(test)]
macro_rules! assert_float_eq {
    ($a:expr, $b:expr, $eps:expr, $debug:expr) => {{
        let a: f64 = $a;
        let b: f64 = $b;
        let eps: f64 = $eps;
        let error = (a - b).abs();
        if error > eps {
            eprintln!("{:?}", $debug);
        }
        assert!(
            error <= eps,
            "Assertion failed: |({}) - ({})| = {:e} <= {:e}",
            a,
            b,
            error,
            eps
        );
    }};
    ($a:expr, $b:expr, $eps:expr) => {
        $crate::macros::assert_float_eq!($a, $b, $eps, "")
    };
    ($a:expr, $b:expr) => {
        $crate::macros::assert_float_eq!($a, $b, 1e-12)
    };
}

/// Assert that two vectors are equal within `eps`, coordinate-wise.
#[cfg(test)]
macro_rules! assert_vec_eq {
    ($a:expr, $b:expr, $eps:expr) => {{
        let a: glam::DVec3 = $a;
        let b: glam::DVec3 = $b;
        assert!(
            a.abs_diff_eq(b, $eps),
            "Assertion failed: {} == {} within {:e}",
            a,
            b,
            $eps
        );
    }};
    ($a:expr, $b:expr) => {
        $crate::macros::assert_vec_eq!($a, $b, 1e-12)
    };
}

#[cfg(test)]
pub(crate) use assert_float_eq;
#[cfg(test)]
pub(crate) use assert_vec_eq;
