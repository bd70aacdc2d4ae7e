//
// Macros
//
macro_rules! ok_some {
    ($x:expr) => (Ok(Some($x)))
}

macro_rules! check {
    ($check:expr, $err:expr) => (
        if !$check {
            return Err($err);
        }
    )
}

#[cfg(test)]
macro_rules! vec_deque {
    ($( $x:expr ),*) => ({
        let v = vec![$( $x ),*];
        ::std::collections::VecDeque::from(v)
    });
    ($( $x:expr, )*) => (vec_deque![ $( $x ),* ]);
}
