//! Plain-text table rendering for `persons list`

use person_store::Person;

const HEADERS: [&str; 3] = ["ID", "Name", "Age"];

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

const ALIGNMENTS: [Align; 3] = [Align::Right, Align::Left, Align::Right];

fn pad(value: &str, width: usize, align: Align) -> String {
    match align {
        Align::Left => format!("{:<width$}", value, width = width),
        Align::Right => format!("{:>width$}", value, width = width),
    }
}

/// Render people as a boxed table with a centered title
pub fn people_table(title: &str, people: &[Person]) -> String {
    let rows: Vec<[String; 3]> = people
        .iter()
        .map(|person| [person.id.to_string(), person.name.clone(), person.age.to_string()])
        .collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = {
        let segments: Vec<String> = widths.iter().map(|width| "-".repeat(width + 2)).collect();
        format!("+{}+", segments.join("+"))
    };

    let line = |cells: &[String; 3]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter().zip(ALIGNMENTS))
            .map(|(cell, (width, align))| format!(" {} ", pad(cell, *width, align)))
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let total_width = border.chars().count();
    let mut output = vec![format!("{:^width$}", title, width = total_width), border.clone()];
    output.push(line(&HEADERS.map(String::from)));
    output.push(border.clone());
    output.extend(rows.iter().map(line));
    output.push(border);

    output.join("\n")
}
