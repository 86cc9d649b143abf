use std::collections::HashMap;

use crate::error::{
    FieldExtractionError, LineageError, LineageResult, LineageWarning, MissingAttribute,
};
use crate::field::{dedup_worksheets, Field, FieldCategory, UNKNOWN_DATATYPE};
use crate::options::{LineageOptions, OperatingMode};
use crate::record::{RawDatasource, RawFieldRecord};
use crate::resolver::FriendlyNames;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: Vec<Field>,
    friendly_names: FriendlyNames,
}

impl FieldCatalog {
    /// One field per `(id, calculation)` pair. Parameters echoed into other data sources
    /// collapse onto their parameter instance; among duplicates the best category wins
    /// (parameter, calculated, default), first seen among equals, at the first-seen position.
    pub fn build(
        datasources: &[RawDatasource],
        options: &LineageOptions,
        warnings: &mut Vec<LineageWarning>,
    ) -> LineageResult<Self> {
        let friendly_names = FriendlyNames::from_datasources(datasources);

        let mut fields: Vec<Field> = Vec::new();
        let mut slots: HashMap<(String, Option<String>), usize> = HashMap::new();
        let mut total = 0usize;

        for ds in datasources {
            let caption = ds.display_caption().to_string();
            for (position, record) in ds.fields.iter().enumerate() {
                total += 1;
                let field = match extract_field(ds, &caption, position, record, options) {
                    Ok(field) => field,
                    Err(err) => match options.mode {
                        OperatingMode::Batch => return Err(LineageError::FieldExtraction(err)),
                        OperatingMode::Interactive => {
                            log::warn!("skipping field: {err}");
                            warnings.push(LineageWarning::SkippedField(err));
                            continue;
                        }
                    },
                };

                let key = (field.id.clone(), field.calculation.clone());
                match slots.get(&key) {
                    None => {
                        slots.insert(key, fields.len());
                        fields.push(field);
                    }
                    Some(&slot) => {
                        let kept = &mut fields[slot];
                        if field.category.dedup_rank() < kept.category.dedup_rank() {
                            log::debug!(
                                "{} from {} replaces its {} instance from {}",
                                field.id,
                                field.datasource_name,
                                kept.category,
                                kept.datasource_name
                            );
                            *kept = field;
                        }
                    }
                }
            }
        }

        for field in &mut fields {
            let Some(calculation) = field.calculation.as_deref() else {
                continue;
            };
            match friendly_names.substitute(calculation) {
                Ok(display) => field.display_calculation = Some(display),
                Err(error) => {
                    let warning = LineageWarning::Substitution {
                        field_id: field.id.clone(),
                        error,
                    };
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }

        log::debug!(
            "catalog: {} records, {} fields after dedup",
            total,
            fields.len()
        );

        Ok(Self {
            fields,
            friendly_names,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn friendly_names(&self) -> &FriendlyNames {
        &self.friendly_names
    }

    /// Fields used in at least one worksheet, in catalog order.
    pub fn used(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_used())
    }
}

impl<'a> IntoIterator for &'a FieldCatalog {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

fn extract_field(
    ds: &RawDatasource,
    caption: &str,
    position: usize,
    record: &RawFieldRecord,
    options: &LineageOptions,
) -> Result<Field, FieldExtractionError> {
    let id = non_blank(record.id.as_deref());
    let name = non_blank(record.name.as_deref());
    let missing = match (id, name) {
        (Some(id), Some(name)) => {
            let calculation = record.calculation.clone();
            let category = FieldCategory::classify(
                &ds.name,
                &options.parameters_datasource,
                calculation.is_some(),
            );
            return Ok(Field {
                id: id.to_string(),
                name: name.to_string(),
                datasource_name: ds.name.clone(),
                datasource_caption: caption.to_string(),
                display_calculation: calculation.clone(),
                calculation,
                category,
                worksheets: dedup_worksheets(&record.worksheets),
                datatype: non_blank(record.datatype.as_deref())
                    .unwrap_or(UNKNOWN_DATATYPE)
                    .to_string(),
            });
        }
        (None, _) => MissingAttribute::Id,
        (Some(_), None) => MissingAttribute::Name,
    };

    Err(FieldExtractionError {
        datasource: ds.name.clone(),
        position,
        missing,
        partial_id: id.map(str::to_string),
        partial_name: name.map(str::to_string),
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
