use crate::schema::builtin::builtin_schemas;
use crate::schema::processor_schema::SchemaConfigRow;
use crate::schema::{ProcessorSchema, SchemaError};
use csv::{ReaderBuilder, Trim};
use dashmap::DashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Processor name -> schema lookup. Populated at startup, read concurrently afterwards.
pub struct SchemaRegistry {
    schemas: DashMap<String, Arc<ProcessorSchema>>
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            schemas: DashMap::new()
        }
    }

    /// Creates a registry seeded with the embedded processor schemas.
    pub fn with_builtin_schemas() -> Result<Self, SchemaError> {
        let registry = Self::new();

        for schema in builtin_schemas() {
            registry.register(schema)?;
        }

        Ok(registry)
    }

    /// Registers a schema after checking its invariants. An existing schema with the same
    /// processor name is replaced and returned.
    pub fn register(&self, schema: ProcessorSchema) -> Result<Option<Arc<ProcessorSchema>>, SchemaError> {
        schema.validate()?;

        let key = normalize(&schema.processor_name);
        let previous = self.schemas.insert(key, Arc::new(schema));

        if let Some(replaced) = &previous {
            warn!("Schema for processor [{}] was overwritten", replaced.processor_name);
        }

        Ok(previous)
    }

    /// Looks a schema up by processor name, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    /// Returns `SchemaError::UnknownProcessor` when nothing is registered under that name.
    pub fn lookup(&self, processor_name: &str) -> Result<Arc<ProcessorSchema>, SchemaError> {
        self.schemas.get(&normalize(processor_name))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SchemaError::unknown_processor(processor_name))
    }

    /// Loads and registers every schema in a CSV configuration file.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<usize, SchemaError> {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_path(path.as_ref())?;

        let loaded = self.load_from(reader)?;
        info!("Loaded [{loaded}] processor schemas from {}", path.as_ref().display());

        Ok(loaded)
    }

    /// Loads and registers every schema from CSV configuration content.
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<usize, SchemaError> {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(reader);

        self.load_from(reader)
    }

    /// Finds the schema whose mapped columns all appear in a statement header.
    ///
    /// When several schemas fit, the one with the longest revenue column name wins since it
    /// is the most specific match; remaining ties go to the alphabetically first processor.
    pub fn detect(&self, header: &[String]) -> Option<Arc<ProcessorSchema>> {
        let columns: Vec<String> = header.iter().map(|column| normalize(column)).collect();

        let mut matches: Vec<Arc<ProcessorSchema>> = self.schemas.iter()
            .filter(|entry| {
                entry.value().mapped_columns().iter().all(|column| columns.contains(&normalize(column)))
            })
            .map(|entry| entry.value().clone())
            .collect();

        matches.sort_by(|left, right| {
            right.revenue_field.len().cmp(&left.revenue_field.len())
                .then_with(|| left.processor_name.cmp(&right.processor_name))
        });

        let detected = matches.into_iter().next();

        if let Some(schema) = &detected {
            debug!("Detected processor [{}] from statement header", schema.processor_name);
        }

        detected
    }

    /// Registered processor names, sorted.
    pub fn processors(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.iter()
            .map(|entry| entry.value().processor_name.clone())
            .collect();

        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    fn load_from<R: Read>(&self, mut reader: csv::Reader<R>) -> Result<usize, SchemaError> {
        let mut loaded = 0;

        for result in reader.deserialize::<SchemaConfigRow>() {
            self.register(ProcessorSchema::from(result?))?;
            loaded += 1;
        }

        Ok(loaded)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
