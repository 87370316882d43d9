/// A conversation with one NPC, advanced a line at a time by the confirm key.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialogue {
    pub character_id: String,
    lines: Vec<String>,
    index: usize,
}

impl Dialogue {
    pub fn new(character_id: &str, lines: &[String]) -> Self {
        Self {
            character_id: character_id.to_string(),
            lines: lines.to_vec(),
            index: 0,
        }
    }

    /// The line currently on screen, `None` once the conversation is over
    pub fn current_line(&self) -> Option<&str> {
        self.lines.get(self.index).map(String::as_str)
    }

    /// Move to the next line. Returns true when the conversation has ended.
    pub fn advance(&mut self) -> bool {
        if self.index < self.lines.len() {
            self.index += 1;
        }
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.lines.len()
    }
}
