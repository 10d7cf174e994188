use egui::{Align2, Color32, FontId, Pos2, Rect, Response, Sense, Stroke, Ui};
use solfa_domain::{Accidental, Clef, DomainError};
use tracing::debug;

use crate::staff::{
    DurationClass, StaffLayout, StaffRenderer, StemDirection, STAFF_LINE_POSITIONS,
};

/// Staff drawn with the egui painter.
pub struct StaffView {
    layout: Option<StaffLayout>,
    /// Distance between two staff lines in points.
    pub line_spacing: f32,
}

impl StaffView {
    pub fn new() -> Self {
        Self {
            layout: None,
            line_spacing: 14.0,
        }
    }

    pub fn clear(&mut self) {
        self.layout = None;
    }

    pub fn note_count(&self) -> usize {
        self.layout.as_ref().map_or(0, |layout| layout.notes.len())
    }

    pub fn draw(&self, ui: &mut Ui) -> Response {
        let half = self.line_spacing / 2.0;
        let (top, bottom) = self
            .layout
            .as_ref()
            .map(StaffLayout::vertical_extent)
            .unwrap_or((STAFF_LINE_POSITIONS[4], STAFF_LINE_POSITIONS[0]));
        let height = (top - bottom + 6) as f32 * half;
        let (rect, response) =
            ui.allocate_at_least(egui::vec2(ui.available_width(), height), Sense::hover());
        let painter = ui.painter_at(Rect::from_min_size(rect.min, rect.size()));
        let ink = ui.visuals().text_color();
        let stroke = Stroke::new(1.2, ink);
        let y_of = |position: i32| rect.top() + (top - position + 3) as f32 * half;

        let left = rect.left() + 8.0;
        let right = rect.right() - 8.0;
        for position in STAFF_LINE_POSITIONS {
            let y = y_of(position);
            painter.line_segment([Pos2::new(left, y), Pos2::new(right, y)], stroke);
        }

        let Some(layout) = &self.layout else {
            return response;
        };
        let (symbol, anchor) = match layout.clef {
            Clef::Treble => ("G", STAFF_LINE_POSITIONS[1]),
            Clef::Bass => ("F", STAFF_LINE_POSITIONS[3]),
        };
        painter.text(
            Pos2::new(left + self.line_spacing, y_of(anchor)),
            Align2::CENTER_CENTER,
            symbol,
            FontId::proportional(self.line_spacing * 2.2),
            ink,
        );

        let first_x = left + self.line_spacing * 4.0;
        let usable = (right - first_x).max(self.line_spacing);
        let slot = usable / layout.notes.len().max(1) as f32;
        let head_radius = half * 0.95;
        for (index, note) in layout.notes.iter().enumerate() {
            let x = first_x + slot * (index as f32 + 0.5);
            let y = y_of(note.position);
            for ledger in &note.ledgers {
                let ly = y_of(*ledger);
                painter.line_segment(
                    [
                        Pos2::new(x - head_radius * 2.0, ly),
                        Pos2::new(x + head_radius * 2.0, ly),
                    ],
                    stroke,
                );
            }
            let center = Pos2::new(x, y);
            if note.duration.filled() {
                painter.circle_filled(center, head_radius, ink);
            } else {
                painter.circle_stroke(center, head_radius, Stroke::new(1.6, ink));
            }
            if note.duration.has_stem() {
                let length = self.line_spacing * 3.5;
                let (from, to) = match note.stem {
                    StemDirection::Up => (
                        Pos2::new(x + head_radius, y),
                        Pos2::new(x + head_radius, y - length),
                    ),
                    StemDirection::Down => (
                        Pos2::new(x - head_radius, y),
                        Pos2::new(x - head_radius, y + length),
                    ),
                };
                painter.line_segment([from, to], stroke);
            }
            let accidental = match note.accidental() {
                Accidental::Natural => None,
                Accidental::Sharp => Some("#"),
                Accidental::Flat => Some("b"),
            };
            if let Some(glyph) = accidental {
                painter.text(
                    Pos2::new(x - head_radius * 2.5, y),
                    Align2::CENTER_CENTER,
                    glyph,
                    FontId::proportional(self.line_spacing * 1.4),
                    accidental_color(ink),
                );
            }
        }
        response
    }
}

impl Default for StaffView {
    fn default() -> Self {
        Self::new()
    }
}

impl StaffRenderer for StaffView {
    fn render(&mut self, clef: Clef, notes: &[(&str, DurationClass)]) -> Result<(), DomainError> {
        debug!(clef = clef.id(), count = notes.len(), "laying out staff");
        self.layout = Some(StaffLayout::new(clef, notes)?);
        Ok(())
    }
}

fn accidental_color(ink: Color32) -> Color32 {
    ink.gamma_multiply(0.85)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_tracks_note_count() {
        let mut view = StaffView::new();
        assert_eq!(view.note_count(), 0);
        view.render(
            Clef::Bass,
            &[("e/2", DurationClass::Quarter), ("c/4", DurationClass::Quarter)],
        )
        .unwrap();
        assert_eq!(view.note_count(), 2);
        view.clear();
        assert_eq!(view.note_count(), 0);
    }

    #[test]
    fn failed_render_keeps_previous_layout() {
        let mut view = StaffView::new();
        view.render(Clef::Treble, &[("c/4", DurationClass::Quarter)]).unwrap();
        assert!(view.render(Clef::Treble, &[("zz", DurationClass::Quarter)]).is_err());
        assert_eq!(view.note_count(), 1);
    }
}
