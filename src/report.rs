use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};

/// Comparison of one Jacobian entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryError {
    pub row: usize,
    pub col: usize,
    pub analytic: f64,
    pub estimate: f64,
    /// `|analytic - estimate| / max(1, |estimate|)`.
    pub error: f64,
}

impl EntryError {
    pub fn new(row: usize, col: usize, analytic: f64, estimate: f64) -> Self {
        let error = (analytic - estimate).abs() / estimate.abs().max(1.0);
        Self {
            row,
            col,
            analytic,
            estimate,
            error,
        }
    }
}

/// Outcome of a derivative check.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Largest entry error; near machine epsilon for a correct Jacobian.
    pub accuracy: f64,
    /// Number of entries compared.
    pub compared: usize,
    /// Whether the estimate used sparse differencing.
    pub sparse: bool,
    /// Largest entry errors, worst first.
    pub worst: Vec<EntryError>,
}

/// Number of entries kept in `CheckReport::worst`.
pub const WORST_ENTRIES: usize = 5;

impl CheckReport {
    pub(crate) fn from_entries(entries: impl IntoIterator<Item = EntryError>, sparse: bool) -> Self {
        let mut accuracy: f64 = 0.0;
        let mut compared = 0;
        let mut worst: Vec<EntryError> = Vec::with_capacity(WORST_ENTRIES + 1);
        for entry in entries {
            compared += 1;
            if entry.error.is_nan() || accuracy.is_nan() {
                accuracy = f64::NAN;
            } else if entry.error > accuracy {
                accuracy = entry.error;
            }
            let slot = worst
                .iter()
                .position(|w| !(w.error.is_nan() || w.error >= entry.error))
                .unwrap_or(worst.len());
            if slot < WORST_ENTRIES {
                worst.insert(slot, entry);
                worst.truncate(WORST_ENTRIES);
            }
        }
        Self {
            accuracy,
            compared,
            sparse,
            worst,
        }
    }

    pub fn worst_entry(&self) -> Option<&EntryError> {
        self.worst.first()
    }

    /// Prints the worst entries as a table.
    pub fn emit_table(&self) {
        if !log::log_enabled!(log::Level::Info) {
            println!();
        }
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("row").set_alignment(CellAlignment::Right),
            Cell::new("col").set_alignment(CellAlignment::Right),
            Cell::new("analytic").set_alignment(CellAlignment::Right),
            Cell::new("estimate").set_alignment(CellAlignment::Right),
            Cell::new("error").set_alignment(CellAlignment::Right),
        ]);
        for entry in &self.worst {
            table.add_row(vec![
                Cell::new(entry.row).set_alignment(CellAlignment::Right),
                Cell::new(entry.col).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.6e}", entry.analytic)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.6e}", entry.estimate)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.2e}", entry.error)).set_alignment(CellAlignment::Right),
            ]);
        }

        for line in table.to_string().lines() {
            emit_line(line);
        }
        emit_line(&format!(
            "accuracy: {:.3e} over {} entries ({})",
            self.accuracy,
            self.compared,
            if self.sparse { "sparse" } else { "dense" }
        ));
    }
}

pub(crate) fn emit_line(line: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{line}");
    } else {
        println!("{line}");
    }
}
