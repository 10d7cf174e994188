use solfa_domain::{Accidental, Clef, DomainError};

use crate::staff::{DurationClass, StaffLayout, StaffRenderer, STAFF_LINE_POSITIONS};

const MARGIN: usize = 2;

/// Renders the staff as plain text, one row per half step.
#[derive(Debug, Default, Clone)]
pub struct TextStaff {
    output: String,
}

impl TextStaff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }
}

impl StaffRenderer for TextStaff {
    fn render(&mut self, clef: Clef, notes: &[(&str, DurationClass)]) -> Result<(), DomainError> {
        let layout = StaffLayout::new(clef, notes)?;
        self.output = layout_to_text(&layout);
        Ok(())
    }
}

fn clef_symbol(clef: Clef) -> char {
    match clef {
        Clef::Treble => 'G',
        Clef::Bass => 'F',
    }
}

fn head(duration: DurationClass) -> char {
    if duration.filled() {
        '@'
    } else {
        'o'
    }
}

fn layout_to_text(layout: &StaffLayout) -> String {
    let (top, bottom) = layout.vertical_extent();
    // The clef letter marks the line that names it: g/4 in treble, f/3 in bass.
    let clef_row = match layout.clef {
        Clef::Treble => STAFF_LINE_POSITIONS[1],
        Clef::Bass => STAFF_LINE_POSITIONS[3],
    };
    let mut out = String::new();
    for position in (bottom..=top).rev() {
        let on_staff = position % 2 == 0 && STAFF_LINE_POSITIONS.contains(&position);
        let staff_fill = if on_staff { '-' } else { ' ' };
        let mut row = String::new();
        for column in 0..MARGIN {
            if column == 0 && position == clef_row {
                row.push(clef_symbol(layout.clef));
            } else {
                row.push(staff_fill);
            }
        }
        for note in &layout.notes {
            let fill = if on_staff || note.ledgers.contains(&position) {
                '-'
            } else {
                staff_fill
            };
            row.push(fill);
            if note.position == position {
                row.push(match note.accidental() {
                    Accidental::Natural => fill,
                    Accidental::Sharp => '#',
                    Accidental::Flat => 'b',
                });
                row.push(head(note.duration));
            } else {
                row.push(fill);
                row.push(fill);
            }
            row.push(fill);
        }
        row.push(staff_fill);
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_staff_has_five_lines() {
        let mut staff = TextStaff::new();
        staff.render(Clef::Treble, &[]).unwrap();
        let rows: Vec<&str> = staff.as_str().lines().collect();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows.iter().filter(|r| r.contains('-')).count(), 5);
    }

    #[test]
    fn middle_c_draws_a_ledger_line() {
        let mut staff = TextStaff::new();
        staff.render(Clef::Treble, &[("c/4", DurationClass::Quarter)]).unwrap();
        let rows: Vec<&str> = staff.as_str().lines().collect();
        // Positions 10 down to 0.
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[10].trim(), "--@-");
    }

    #[test]
    fn notes_are_laid_out_left_to_right() {
        let mut staff = TextStaff::new();
        staff
            .render(
                Clef::Treble,
                &[("b/4", DurationClass::Quarter), ("f#/5", DurationClass::Half)],
            )
            .unwrap();
        let rows: Vec<&str> = staff.as_str().lines().collect();
        let top = rows[0];
        let middle = rows[4];
        assert!(top.find("#o").unwrap() > 4);
        assert!(middle.find('@').unwrap() < top.find('o').unwrap());
        assert!(rows[6].starts_with('G'));
    }
}
