/// Character cursor over a single source line
#[derive(Debug)]
pub struct Chars {
    vec: Vec<char>,
    index: usize,
}

impl Iterator for Chars {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let r = self.peek(0);
        if r.is_some() {
            self.index += 1;
        }
        r
    }
}

impl Chars {
    pub fn peek(&self, i: usize) -> Option<char> {
        self.vec.get(self.index + i).cloned()
    }

    pub fn advance(&mut self, n: usize) {
        self.index = (self.index + n).min(self.vec.len());
    }

    pub fn skip_line(&mut self) {
        self.index = self.vec.len();
    }

    pub fn pos(&self) -> usize {
        self.index
    }

    pub fn from_str(s: &str) -> Chars {
        Chars {
            vec: s.chars().collect(),
            index: 0,
        }
    }
}
