//! Cost tables rendered as bordered text

/// Rows of `(label, cost)` kept sorted by cost, highest first
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownTable {
    label_header: String,
    rows: Vec<(String, f64)>,
}

/// The rows cut off by [`BreakdownTable::truncate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rollup {
    pub count: usize,
    pub total: f64,
}

impl BreakdownTable {
    pub fn new<I, S>(label_header: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut rows: Vec<(String, f64)> = rows.into_iter().map(|(l, c)| (l.into(), c)).collect();
        // Stable, so equal costs keep upstream order
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self {
            label_header: label_header.to_string(),
            rows,
        }
    }

    pub fn rows(&self) -> &[(String, f64)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|(_, c)| c).sum()
    }

    /// Keep the `limit` most expensive rows and summarize the rest
    pub fn truncate(mut self, limit: usize) -> (Self, Option<Rollup>) {
        if self.rows.len() <= limit {
            return (self, None);
        }

        let rest = self.rows.split_off(limit);
        let rollup = Rollup {
            count: rest.len(),
            total: rest.iter().map(|(_, c)| c).sum(),
        };
        (self, Some(rollup))
    }

    /// Bordered text table, one string per line
    pub fn render(&self) -> Vec<String> {
        let cells: Vec<(String, String)> = self
            .rows
            .iter()
            .map(|(label, cost)| (label.clone(), format!("{:.2}", cost)))
            .collect();

        let label_width = cells
            .iter()
            .map(|(l, _)| l.chars().count())
            .chain(std::iter::once(self.label_header.chars().count()))
            .max()
            .unwrap_or(0);
        let cost_width = cells
            .iter()
            .map(|(_, c)| c.len())
            .chain(std::iter::once(COST_HEADER.len()))
            .max()
            .unwrap_or(0);

        let border = format!(
            "+{}+{}+",
            "-".repeat(label_width + 2),
            "-".repeat(cost_width + 2)
        );

        let mut lines = Vec::with_capacity(cells.len() + 4);
        lines.push(border.clone());
        lines.push(format!(
            "| {:^lw$} | {:^cw$} |",
            self.label_header,
            COST_HEADER,
            lw = label_width,
            cw = cost_width
        ));
        lines.push(border.clone());
        for (label, cost) in &cells {
            lines.push(format!(
                "| {:<lw$} | {:>cw$} |",
                label,
                cost,
                lw = label_width,
                cw = cost_width
            ));
        }
        lines.push(border);
        lines
    }
}

const COST_HEADER: &str = "Cost";
