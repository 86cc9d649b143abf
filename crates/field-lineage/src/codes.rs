use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::catalog::FieldCatalog;
use crate::error::{LineageError, LineageResult};
use crate::field::{Field, FieldCategory};

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Codes available in each pool.
pub const POOL_CAPACITY: usize = LETTERS.len() * LETTERS.len();

pub const CALCULATED_PREFIX: &str = "x___";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CodePool {
    /// Default fields and parameters.
    Default,
    Calculated,
}

impl CodePool {
    pub fn for_category(category: FieldCategory) -> Self {
        match category {
            FieldCategory::CalculatedField => CodePool::Calculated,
            FieldCategory::DefaultField | FieldCategory::Parameter => CodePool::Default,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            CodePool::Default => "",
            CodePool::Calculated => CALCULATED_PREFIX,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CodePool::Default => "default",
            CodePool::Calculated => "calculated",
        }
    }
}

impl fmt::Display for CodePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `AA`, `AB`, ..., `ZZ`, prefixed with [`CALCULATED_PREFIX`] in the calculated pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortCode(String);

impl ShortCode {
    /// The `n`-th code of `pool`, or `None` past the pool capacity.
    pub fn nth(pool: CodePool, n: usize) -> Option<Self> {
        if n >= POOL_CAPACITY {
            return None;
        }
        let hi = LETTERS[n / LETTERS.len()] as char;
        let lo = LETTERS[n % LETTERS.len()] as char;
        Some(ShortCode(format!("{}{hi}{lo}", pool.prefix())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn pool(&self) -> CodePool {
        if self.0.starts_with(CALCULATED_PREFIX) {
            CodePool::Calculated
        } else {
            CodePool::Default
        }
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShortCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One allocated code and the catalog position of its field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeAssignment {
    pub code: ShortCode,
    pub field_index: usize,
}

/// Bijection between used fields (by catalog position) and short codes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeTable {
    default: Vec<CodeAssignment>,
    calculated: Vec<CodeAssignment>,
    by_field: HashMap<usize, ShortCode>,
    by_code: HashMap<ShortCode, usize>,
}

impl CodeTable {
    pub fn code_for(&self, field_index: usize) -> Option<&ShortCode> {
        self.by_field.get(&field_index)
    }

    pub fn field_for(&self, code: &ShortCode) -> Option<usize> {
        self.by_code.get(code).copied()
    }

    /// Assignments of one pool, in allocation order.
    pub fn pool(&self, pool: CodePool) -> &[CodeAssignment] {
        match pool {
            CodePool::Default => &self.default,
            CodePool::Calculated => &self.calculated,
        }
    }

    /// All assignments: default pool first, then calculated, each in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &CodeAssignment> {
        self.default.iter().chain(self.calculated.iter())
    }

    pub fn len(&self) -> usize {
        self.by_field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    fn push(&mut self, pool: CodePool, field_index: usize, code: ShortCode) {
        self.by_field.insert(field_index, code.clone());
        self.by_code.insert(code.clone(), field_index);
        let assignment = CodeAssignment { code, field_index };
        match pool {
            CodePool::Default => self.default.push(assignment),
            CodePool::Calculated => self.calculated.push(assignment),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IdentifierAllocator;

impl IdentifierAllocator {
    pub fn new() -> Self {
        Self
    }

    /// Assigns a code to every used field of `catalog`.
    ///
    /// Fails with [`LineageError::IdentifierExhaustion`] when a pool would need more than
    /// [`POOL_CAPACITY`] codes; nothing is truncated.
    pub fn allocate(&self, catalog: &FieldCatalog) -> LineageResult<CodeTable> {
        self.allocate_fields(catalog.fields())
    }

    pub fn allocate_fields(&self, fields: &[Field]) -> LineageResult<CodeTable> {
        let mut table = CodeTable::default();
        for pool in [CodePool::Default, CodePool::Calculated] {
            let members: Vec<usize> = fields
                .iter()
                .enumerate()
                .filter(|(_, f)| f.is_used() && CodePool::for_category(f.category) == pool)
                .map(|(idx, _)| idx)
                .collect();

            let required = members.len();
            let exhausted = || LineageError::IdentifierExhaustion {
                pool,
                required,
                capacity: POOL_CAPACITY,
            };
            if required > POOL_CAPACITY {
                return Err(exhausted());
            }

            for (n, field_index) in members.into_iter().enumerate() {
                let code = ShortCode::nth(pool, n).ok_or_else(exhausted)?;
                table.push(pool, field_index, code);
            }
        }

        log::debug!(
            "allocated {} default and {} calculated codes",
            table.default.len(),
            table.calculated.len()
        );
        Ok(table)
    }
}
