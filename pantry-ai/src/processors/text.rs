/// Text input needs no model call
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPassthrough;

impl TextPassthrough {
    pub fn process(&self, text: &str) -> String {
        text.to_string()
    }
}
