use bimap::BiMap;
use string_cache::DefaultAtom;

use crate::bytecode::Word;

/**
  A symbol table for assembly is a mapping between label names and the program address
  they stand for. It is just a convenience wrapper around a BiMap, so each label names one
  address and each address carries at most one label.
*/
#[derive(Clone, Debug, Default)]
pub struct SymbolTable{
  table: BiMap<DefaultAtom, Word>
}

impl SymbolTable{

  pub fn new() -> SymbolTable {
    SymbolTable{
      table: BiMap::new()
    }
  }

  pub fn get_label(&self, address: Word) -> Option<&DefaultAtom>{
    self.table.get_by_right(&address)
  }

  pub fn get_address(&self, label: &DefaultAtom) -> Option<Word>{
    self.table.get_by_left(label).copied()
  }

  /// Binds `label` to `address`. Fails, changing nothing, if either is already bound.
  pub fn insert(&mut self, label: DefaultAtom, address: Word)
    -> Result<(), (DefaultAtom, Word)>{
    self.table.insert_no_overwrite(label, address)
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }
}
