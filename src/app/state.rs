/// Whether the palette is showing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PaletteMode {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaletteState {
    pub mode: PaletteMode,
    pub query: String,
    pub selected_index: usize, // Index into the flattened result rows
}

impl PaletteState {
    pub fn is_open(&self) -> bool {
        self.mode == PaletteMode::Open
    }

    pub(crate) fn open(&mut self) {
        self.mode = PaletteMode::Open;
        self.reset_input();
    }

    pub(crate) fn close(&mut self) {
        self.mode = PaletteMode::Closed;
        self.reset_input();
    }

    pub(crate) fn set_query(&mut self, query: String) {
        self.query = query;
        self.selected_index = 0;
    }

    /// Moves the highlight by one row, wrapping at both ends.
    pub(crate) fn select_next(&mut self, rows: usize) {
        if rows > 0 {
            self.selected_index = (self.selected_index + 1) % rows;
        }
    }

    pub(crate) fn select_prev(&mut self, rows: usize) {
        if rows > 0 {
            self.selected_index = if self.selected_index == 0 || self.selected_index >= rows {
                rows - 1
            } else {
                self.selected_index - 1
            };
        }
    }

    fn reset_input(&mut self) {
        self.query.clear();
        self.selected_index = 0;
    }
}
