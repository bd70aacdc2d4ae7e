macro_rules! is_whitespace {
    ($x:expr) => ($x == ' ' || $x == '\t' || $x == '\n' || $x == '\r')
}

// Characters that end a symbol or number run
macro_rules! is_delimiter {
    ($x:expr) => (
        match $x {
            None => true,
            Some(y) => {
                y == '(' || y == ')' || y == '\'' || y == '`' || y == ','
                    || y == '"' || y == ';' || is_whitespace!(y)
            }
        }
    )
}

macro_rules! is_digit {
    ($c:expr) => (
        match $c {
            '0'..='9' => true,
            _ => false
        }
    )
}
