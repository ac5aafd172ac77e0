use std::collections::HashMap;

use string_cache::DefaultAtom;

use crate::bytecode::Word;

/**
  The label table maps label names to the word address they were defined at. It is filled in by
  the first pass of the assembler and read by the second. Several labels may share an address,
  but a name is defined at most once.
*/
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelTable {
  table: HashMap<DefaultAtom, Word>
}

impl LabelTable {

  pub fn new() -> LabelTable {
    LabelTable {
      table: HashMap::new()
    }
  }

  pub fn get_address(&self, name: &str) -> Option<Word> {
    self.table.get(&DefaultAtom::from(name)).copied()
  }

  /// Records `name` at `address`. If the name is already defined, its existing address is
  /// returned as the error and the table is left unchanged.
  pub fn insert(&mut self, name: DefaultAtom, address: Word) -> Result<(), Word> {
    match self.table.get(&name) {
      Some(existing) => Err(*existing),
      None => {
        self.table.insert(name, address);
        Ok(())
      }
    }
  }

  /// Moves every label forward by `distance` words.
  pub fn shift(&mut self, distance: Word) {
    for address in self.table.values_mut() {
      *address += distance;
    }
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

  pub fn clear(&mut self) {
    self.table.clear();
  }

  /// Labels ordered by address, then name.
  pub fn sorted(&self) -> Vec<(&str, Word)> {
    let mut labels: Vec<(&str, Word)> =
      self.table.iter().map(|(name, address)| (&**name, *address)).collect();
    labels.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
    labels
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_and_lookup(){
    let mut labels = LabelTable::new();
    assert!(labels.insert(DefaultAtom::from("loop"), 4).is_ok());
    assert!(labels.insert(DefaultAtom::from("end"), 4).is_ok());
    assert_eq!(labels.get_address("loop"), Some(4));
    assert_eq!(labels.get_address("missing"), None);
    assert_eq!(labels.insert(DefaultAtom::from("loop"), 9), Err(4));
    assert_eq!(labels.get_address("loop"), Some(4));
  }

  #[test]
  fn shift_moves_every_label(){
    let mut labels = LabelTable::new();
    labels.insert(DefaultAtom::from("f"), 0).unwrap();
    labels.insert(DefaultAtom::from("start"), 6).unwrap();
    labels.shift(2);
    assert_eq!(labels.sorted(), vec![("f", 2), ("start", 8)]);
  }

}
