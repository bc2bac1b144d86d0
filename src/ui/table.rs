use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::{Padding, Style};

use crate::ui::widgets::TableSpec;

/// Borderless columns; the header row gets a blank line beneath it.
pub fn render_table(spec: &TableSpec) -> String {
    let mut builder = Builder::default();
    if !spec.headers.is_empty() {
        builder.push_record(spec.headers.iter().map(String::as_str));
    }
    for row in &spec.rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    let mut table = builder.build();
    table.with(Style::blank()).with(Padding::new(0, 2, 0, 0));
    if !spec.headers.is_empty() {
        table.modify(Rows::first(), Padding::new(0, 2, 0, 1));
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_line_up_under_headers() {
        let mut spec = TableSpec::with_headers(&["folder", "status"]);
        spec.push_row(vec!["/work/app".to_owned(), "selected".to_owned()]);
        spec.push_row(vec!["/work/docs".to_owned(), "missing Gemfile".to_owned()]);

        let rendered = render_table(&spec);
        let lines = rendered.lines().collect::<Vec<&str>>();
        assert!(lines[0].starts_with("folder"));
        let status_col = lines[0].find("status").expect("status header");
        let app_line = lines
            .iter()
            .find(|line| line.starts_with("/work/app"))
            .expect("app row");
        assert_eq!(app_line.find("selected"), Some(status_col));
    }
}
