//! Tabular rendering of the machine state, printed before every step when
//! `trace_computation` is enabled.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};
use strum::IntoEnumIterator;

use super::VM;
use crate::bytecode::Word;
use crate::register::Register;

/// Words per row of the memory table.
const MEMORY_ROW_WIDTH: usize = 8;

lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl VM {

  fn make_register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    for register in Register::iter() {
      table.add_row(
        row![r->format!("{} =", register), format!("{}", self.registers.get(register))]
      );
    }
    table
  }

  /// Memory in rows of `MEMORY_ROW_WIDTH` words. The word at IP is marked `*` and the word at
  /// SP is marked `>`.
  fn make_memory_table(&self) -> Table {
    let mut table = Table::new();
    let ip = self.registers.ip() as usize;
    let sp = self.registers.sp() as usize;

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (row_idx, words) in self.memory.as_slice().chunks(MEMORY_ROW_WIDTH).enumerate() {
      let start = row_idx * MEMORY_ROW_WIDTH;
      let contents =
        words
          .iter()
          .enumerate()
          .map(|(i, word): (usize, &Word)| {
            let marker = match start + i {
              address if address == ip => "*",
              address if address == sp => ">",
              _ => " "
            };
            format!("{}{:>10}", marker, word)
          })
          .collect::<Vec<String>>()
          .join(" ");

      table.add_row(row![r->format!("[{}] =", start), contents]);
    }
    table
  }

}

impl Display for VM {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let r_table = self.make_register_table();
    let m_table = self.make_memory_table();

    let mut combined_table = table!([r_table, m_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Memory"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "{}", combined_table)
  }
}
