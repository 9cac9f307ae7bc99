//! The departure registry.
//!
//! A [`Registry`] owns the in-memory record set and the backend that
//! persists it. Every mutation validates first, builds the record set it
//! would produce, hands that to the backend, and only swaps it in once the
//! backend reports success. A failed write therefore leaves both memory and
//! storage as they were.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::departure::{
    Departure, DepartureId, DepartureInput, DepartureTime, Destination, TransportType,
};
use crate::error::{Error, Result};
use crate::export::{self, CsvOptions, ExportFormat};
use crate::ids::IdAllocator;
use crate::import::{self, ImportPolicy, ImportSummary};
use crate::query::{filter_departures, sort_departures, Filter, SortKey};
use crate::record::NormalizedRecord;
use crate::rules::UnitRules;
use crate::stats::RegistryStats;
use crate::status::Status;
use crate::storage::{open_backend, Backend, Change, MemoryBackend};

/// The departure registry.
#[derive(Debug)]
pub struct Registry {
    departures: Vec<Departure>,
    backend: Box<dyn Backend>,
    rules: UnitRules,
    ids: IdAllocator,
    import_policy: ImportPolicy,
    csv: CsvOptions,
}

impl Registry {
    /// Open the registry described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the stored data
    /// cannot be read.
    pub fn open(config: &Config) -> Result<Self> {
        let rules = UnitRules::from_config(&config.validation)?;
        let csv = CsvOptions::from_config(&config.export)?;
        let backend = open_backend(config)?;

        let mut registry = Self::with_backend(backend, rules)?;
        registry.import_policy = config.import.policy;
        registry.csv = csv;
        Ok(registry)
    }

    /// Load a registry from an already opened backend.
    ///
    /// Stored records are normalized. If any label was migrated or any id had
    /// to be reassigned, the cleaned set is written back once.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read or holds a record
    /// that cannot be normalized.
    pub fn with_backend(mut backend: Box<dyn Backend>, rules: UnitRules) -> Result<Self> {
        let records = backend.load()?;
        let normalized = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                record.normalize().map_err(|message| Error::StorageCorrupt {
                    path: backend.location().to_path_buf(),
                    message: format!("record {index}: {message}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut ids = IdAllocator::new();
        for id in normalized.iter().filter_map(|r| r.id) {
            ids.observe(id);
        }

        let mut seen_ids = HashSet::new();
        let mut seen_units = HashSet::new();
        let mut migrated = 0usize;
        let mut reassigned = 0usize;
        let mut departures = Vec::with_capacity(normalized.len());

        for record in normalized {
            if record.migrated {
                migrated += 1;
            }
            let id = match record.id {
                Some(id) if seen_ids.insert(id) => id,
                _ => {
                    reassigned += 1;
                    let id = ids.allocate()?;
                    seen_ids.insert(id);
                    id
                }
            };
            if !seen_units.insert(record.unit_number.clone()) {
                warn!("Unit number {} is stored more than once", record.unit_number);
            }
            departures.push(record.into_departure(id));
        }

        if migrated > 0 || reassigned > 0 {
            warn!(
                "Normalized {} legacy records and reassigned {} ids from {}",
                migrated,
                reassigned,
                backend.location().display()
            );
            if let Err(e) = backend.apply(&Change::Replace, &departures) {
                warn!("Could not write migrated records back: {}", e);
            }
        }

        info!(
            "Loaded {} departures from {} storage",
            departures.len(),
            backend.name()
        );

        Ok(Self {
            departures,
            backend,
            rules,
            ids,
            import_policy: ImportPolicy::default(),
            csv: CsvOptions::default(),
        })
    }

    /// An empty session-only registry with the default rules.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            departures: Vec::new(),
            backend: Box::new(MemoryBackend::new()),
            rules: UnitRules::default(),
            ids: IdAllocator::new(),
            import_policy: ImportPolicy::default(),
            csv: CsvOptions::default(),
        }
    }

    /// Replace the validation rules.
    #[must_use]
    pub fn with_rules(mut self, rules: UnitRules) -> Self {
        self.rules = rules;
        self
    }

    /// Set the policy used when `import` is called without one.
    #[must_use]
    pub fn with_import_policy(mut self, policy: ImportPolicy) -> Self {
        self.import_policy = policy;
        self
    }

    /// Set the CSV export options.
    #[must_use]
    pub fn with_csv_options(mut self, options: CsvOptions) -> Self {
        self.csv = options;
        self
    }

    /// Backend kind.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Where the records are stored.
    #[must_use]
    pub fn location(&self) -> &Path {
        self.backend.location()
    }

    /// Default import policy.
    #[must_use]
    pub fn import_policy(&self) -> ImportPolicy {
        self.import_policy
    }

    /// All departures, in list order.
    #[must_use]
    pub fn all(&self) -> &[Departure] {
        &self.departures
    }

    /// Number of departures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.departures.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.departures.is_empty()
    }

    /// Look up a departure by id.
    #[must_use]
    pub fn get(&self, id: DepartureId) -> Option<&Departure> {
        self.departures.iter().find(|d| d.id == id)
    }

    /// Look up a departure by unit number, ignoring case.
    #[must_use]
    pub fn get_by_unit(&self, unit_number: &str) -> Option<&Departure> {
        let wanted = unit_number.trim().to_uppercase();
        self.departures
            .iter()
            .find(|d| d.unit_number.to_uppercase() == wanted)
    }

    /// Add a departure.
    ///
    /// # Errors
    ///
    /// Returns `MissingField`, `InvalidFormat` or `DuplicateUnit` for bad
    /// input, or a storage error if the write fails.
    pub fn add(&mut self, input: &DepartureInput) -> Result<Departure> {
        let valid = self.rules.validate(input)?;
        self.ensure_unique(&valid.unit_number, None)?;

        let departure = valid.into_departure(self.ids.allocate()?);
        self.insert(departure)
    }

    /// Replace every field of a departure except its id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no departure has `id`, the same validation
    /// errors as [`Registry::add`], or a storage error.
    pub fn update(&mut self, id: DepartureId, input: &DepartureInput) -> Result<Departure> {
        let index = self.index_of(id)?;
        let valid = self.rules.validate(input)?;
        // Duplicates kept from storage may still be edited under their own unit.
        if !self.departures[index]
            .unit_number
            .eq_ignore_ascii_case(&valid.unit_number)
        {
            self.ensure_unique(&valid.unit_number, Some(id))?;
        }

        let departure = valid.into_departure(id);
        let mut next = self.departures.clone();
        next[index] = departure.clone();
        self.persist(&Change::Update(&departure), next)?;

        info!("Updated departure {} ({})", id, departure.unit_number);
        Ok(departure)
    }

    /// Update `id` if it exists, otherwise add the input under that id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` if `id` lies outside `1..=DepartureId::MAX`, the
    /// validation errors of [`Registry::add`], or a storage error.
    pub fn upsert(&mut self, id: DepartureId, input: &DepartureInput) -> Result<Departure> {
        if !id.is_usable() {
            return Err(Error::InvalidId { id });
        }
        if self.get(id).is_some() {
            return self.update(id, input);
        }

        let valid = self.rules.validate(input)?;
        self.ensure_unique(&valid.unit_number, None)?;
        self.ids.observe(id);
        self.insert(valid.into_departure(id))
    }

    /// Remove a departure.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no departure has `id`, or a storage error.
    pub fn delete(&mut self, id: DepartureId) -> Result<Departure> {
        let index = self.index_of(id)?;
        let mut next = self.departures.clone();
        let removed = next.remove(index);
        self.persist(&Change::Delete(id), next)?;

        info!("Deleted departure {} ({})", id, removed.unit_number);
        Ok(removed)
    }

    /// Remove every departure and return how many there were.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub fn clear(&mut self) -> Result<usize> {
        let count = self.departures.len();
        self.persist(&Change::Clear, Vec::new())?;

        info!("Cleared {} departures", count);
        Ok(count)
    }

    /// Departures matching `filter`, in list order.
    #[must_use]
    pub fn find(&self, filter: &Filter) -> Vec<Departure> {
        let found = filter_departures(&self.departures, filter);
        debug!("Filter matched {} of {} departures", found.len(), self.departures.len());
        found
    }

    /// Departures matching `filter`, optionally sorted.
    #[must_use]
    pub fn list(&self, filter: &Filter, sort: Option<SortKey>) -> Vec<Departure> {
        let mut found = self.find(filter);
        if let Some(key) = sort {
            sort_departures(&mut found, key);
        }
        found
    }

    /// Summary counts over the departures matching `filter`.
    #[must_use]
    pub fn stats(&self, filter: &Filter) -> RegistryStats {
        RegistryStats::from_departures(self.departures.iter().filter(|d| filter.matches(d)))
    }

    /// Export the departures matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export(&self, format: ExportFormat, filter: &Filter) -> Result<Vec<u8>> {
        let departures = self.find(filter);
        let bytes = export::export(&departures, format, self.csv)?;
        info!("Exported {} departures as {}", departures.len(), format);
        Ok(bytes)
    }

    /// Import a JSON array of records.
    ///
    /// Uses the configured policy when `policy` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidImportPayload` if any element is malformed (nothing is
    /// imported then), or a storage error.
    pub fn import(&mut self, payload: &str, policy: Option<ImportPolicy>) -> Result<ImportSummary> {
        let records = import::parse_payload(payload)?;
        self.apply_import(records, policy.unwrap_or(self.import_policy))
    }

    /// Add the three example departures, skipping any whose unit already exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub fn seed(&mut self) -> Result<ImportSummary> {
        self.apply_import(example_records(), ImportPolicy::Merge)
    }

    fn apply_import(
        &mut self,
        records: Vec<NormalizedRecord>,
        policy: ImportPolicy,
    ) -> Result<ImportSummary> {
        let plan = import::plan_import(&self.departures, records, policy, &mut self.ids)?;
        let summary = plan.summary;

        match policy {
            ImportPolicy::Replace => self.persist(&Change::Replace, plan.departures)?,
            ImportPolicy::Merge if summary.added > 0 => {
                let added = plan.added().to_vec();
                self.persist(&Change::Append(&added), plan.departures)?;
            }
            ImportPolicy::Merge => {}
        }

        info!("Imported with {} policy: {}", policy, summary);
        Ok(summary)
    }

    fn insert(&mut self, departure: Departure) -> Result<Departure> {
        let mut next = self.departures.clone();
        next.push(departure.clone());
        self.persist(&Change::Insert(&departure), next)?;

        info!("Added departure {} ({})", departure.id, departure.unit_number);
        Ok(departure)
    }

    fn persist(&mut self, change: &Change<'_>, next: Vec<Departure>) -> Result<()> {
        if let Err(e) = self.backend.apply(change, &next) {
            warn!("Failed to persist {}: {}", change.kind(), e);
            return Err(e);
        }
        self.departures = next;
        Ok(())
    }

    fn index_of(&self, id: DepartureId) -> Result<usize> {
        self.departures
            .iter()
            .position(|d| d.id == id)
            .ok_or(Error::NotFound { id })
    }

    fn ensure_unique(&self, unit_number: &str, except: Option<DepartureId>) -> Result<()> {
        let taken = self
            .departures
            .iter()
            .filter(|d| Some(d.id) != except)
            .any(|d| d.unit_number.eq_ignore_ascii_case(unit_number));
        if taken {
            return Err(Error::DuplicateUnit {
                unit_number: unit_number.to_string(),
            });
        }
        Ok(())
    }
}

fn example_records() -> Vec<NormalizedRecord> {
    (0u32..3)
        .filter_map(|i| {
            let departure_time = DepartureTime::from_hm(6 + i, 30)?;
            Some(NormalizedRecord {
                id: None,
                unit_number: format!("TOG100{}", i + 1),
                destination: Destination::Trondheim,
                departure_time,
                gate: format!("G{}", i + 1),
                transport_type: TransportType::Train,
                status: Status::Delivered,
                comment: Some("Eksempel".to_string()),
                migrated: false,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::record::DepartureRecord;
    use crate::storage::{JsonFileBackend, SqliteBackend};

    fn input(unit: &str, destination: Destination, time: &str) -> DepartureInput {
        DepartureInput::new(
            unit,
            destination,
            time.parse().unwrap(),
            "G1",
            TransportType::Train,
            Status::Planned,
        )
    }

    /// Backend that records changes and can be told to fail.
    #[derive(Debug, Default, Clone)]
    struct FlakyBackend {
        fail: Arc<Mutex<bool>>,
        changes: Arc<Mutex<Vec<String>>>,
        records: Vec<DepartureRecord>,
    }

    impl Backend for FlakyBackend {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn location(&self) -> &Path {
            Path::new("flaky")
        }

        fn load(&self) -> Result<Vec<DepartureRecord>> {
            Ok(self.records.clone())
        }

        fn apply(&mut self, change: &Change<'_>, _snapshot: &[Departure]) -> Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(std::io::Error::other("disk full").into());
            }
            self.changes.lock().unwrap().push(change.kind().to_string());
            Ok(())
        }
    }

    #[test]
    fn test_add_assigns_distinct_ids() {
        let mut registry = Registry::in_memory();
        let a = registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();
        let b = registry.add(&input("TOG1235", Destination::Molde, "08:00")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_rejects_duplicate_case_insensitively() {
        let mut registry = Registry::in_memory();
        registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();

        let err = registry
            .add(&input("tog1234", Destination::Forde, "09:00"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateUnit { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_update_keeps_id_and_allows_own_unit() {
        let mut registry = Registry::in_memory();
        let created = registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();

        let mut changed = input("TOG1234", Destination::Forde, "10:15");
        changed.comment = Some("Ny luke".to_string());
        let updated = registry.update(created.id, &changed).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.destination, Destination::Forde);
        assert_eq!(registry.get(created.id), Some(&updated));
    }

    #[test]
    fn test_update_rejects_other_records_unit() {
        let mut registry = Registry::in_memory();
        registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();
        let second = registry.add(&input("TOG5678", Destination::Molde, "08:00")).unwrap();

        let err = registry
            .update(second.id, &input("TOG1234", Destination::Molde, "08:00"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateUnit { .. }));
        assert_eq!(registry.get(second.id).unwrap().unit_number, "TOG5678");
    }

    #[test]
    fn test_update_unknown_id() {
        let mut registry = Registry::in_memory();
        let err = registry
            .update(DepartureId::new(9), &input("TOG1234", Destination::Molde, "08:00"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_upsert_adds_then_updates() {
        let mut registry = Registry::in_memory();
        let id = DepartureId::new(42);

        let created = registry.upsert(id, &input("TOG1234", Destination::Molde, "08:00")).unwrap();
        assert_eq!(created.id, id);

        let updated = registry.upsert(id, &input("TOG1234", Destination::Stavanger, "08:00")).unwrap();
        assert_eq!(updated.destination, Destination::Stavanger);
        assert_eq!(registry.len(), 1);

        // Later ids never collide with the client-chosen one.
        let next = registry.add(&input("TOG9999", Destination::Molde, "08:00")).unwrap();
        assert!(next.id > id);
    }

    #[test]
    fn test_upsert_rejects_out_of_range_ids() {
        let mut registry = Registry::in_memory();
        for raw in [0, -7, DepartureId::MAX + 1, i64::MAX] {
            let err = registry
                .upsert(DepartureId::new(raw), &input("TOG1234", Destination::Molde, "08:00"))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidId { .. }), "{raw}");
            assert!(err.is_validation_error());
        }
        assert!(registry.is_empty());

        // The allocator was not pushed past the cap.
        registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();
    }

    #[test]
    fn test_upserted_id_survives_json_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avganger.json");
        let id = DepartureId::new(4242);

        {
            let backend = JsonFileBackend::open(&path).unwrap();
            let mut registry =
                Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();
            registry.upsert(id, &input("TOG1234", Destination::Molde, "08:00")).unwrap();
        }

        let backend = JsonFileBackend::open(&path).unwrap();
        let registry = Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all()[0].id, id);
        assert_eq!(registry.all()[0].unit_number, "TOG1234");
    }

    #[test]
    fn test_update_keeps_stored_duplicate_unit() {
        let first = Departure {
            id: DepartureId::new(5),
            unit_number: "TRL0001".to_string(),
            destination: Destination::Haugesund,
            departure_time: "12:00".parse().unwrap(),
            gate: "D4".to_string(),
            transport_type: TransportType::Trailer,
            status: Status::Loading,
            comment: None,
        };
        let mut second = first.clone();
        second.id = DepartureId::new(6);
        let backend = MemoryBackend::with_records(vec![
            DepartureRecord::from(&first),
            DepartureRecord::from(&second),
        ]);
        let mut registry = Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();

        let mut changed = input("trl0001", Destination::Molde, "13:00");
        changed.transport_type = Some(TransportType::Trailer);
        let updated = registry.update(second.id, &changed).unwrap();
        assert_eq!(updated.destination, Destination::Molde);

        // Moving to another taken unit is still refused.
        registry.add(&input("TOG7777", Destination::Molde, "08:00")).unwrap();
        let err = registry
            .update(second.id, &input("TOG7777", Destination::Molde, "08:00"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateUnit { .. }));
    }

    #[test]
    fn test_delete_twice_is_not_found() {
        let mut registry = Registry::in_memory();
        let created = registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();

        registry.delete(created.id).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.delete(created.id),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_clear_returns_count() {
        let mut registry = Registry::in_memory();
        registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();
        registry.add(&input("TOG1235", Destination::Molde, "08:00")).unwrap();

        assert_eq!(registry.clear().unwrap(), 2);
        assert_eq!(registry.clear().unwrap(), 0);
    }

    #[test]
    fn test_storage_failure_keeps_previous_state() {
        let backend = FlakyBackend::default();
        let fail = Arc::clone(&backend.fail);
        let mut registry = Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();
        let kept = registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();

        *fail.lock().unwrap() = true;
        let err = registry
            .add(&input("TOG5678", Destination::Molde, "09:00"))
            .unwrap_err();
        assert!(err.is_storage_error());
        assert!(registry.delete(kept.id).unwrap_err().is_storage_error());
        assert!(registry.clear().is_err());
        assert_eq!(registry.all(), std::slice::from_ref(&kept));

        // Writes work again once the backend recovers.
        *fail.lock().unwrap() = false;
        registry.add(&input("TOG5678", Destination::Molde, "09:00")).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_load_migrates_legacy_records_once() {
        let records: Vec<DepartureRecord> = serde_json::from_str(
            r#"[
                {"id": 1718000000.5, "unitNumber": "TOG1001", "destination": "TRONDHEIM",
                 "time": "06:30", "gate": "G1", "type": "Tog", "status": "Levert", "comment": "None"},
                {"id": 7, "unitNumber": "BIL5678", "destination": "MOLDE",
                 "time": "09:00", "gate": "A1", "type": "Truck", "status": "Delivered", "comment": null}
            ]"#,
        )
        .unwrap();
        let backend = FlakyBackend {
            records,
            ..FlakyBackend::default()
        };
        let changes = Arc::clone(&backend.changes);

        let registry = Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.all()[0].transport_type, TransportType::Train);
        assert_eq!(registry.all()[0].status, Status::Delivered);
        assert_eq!(registry.all()[0].comment, None);
        assert_eq!(registry.all()[1].id, DepartureId::new(7));
        assert_eq!(*changes.lock().unwrap(), vec!["replace".to_string()]);
    }

    #[test]
    fn test_clean_load_writes_nothing() {
        let records = vec![DepartureRecord::from(&Departure {
            id: DepartureId::new(3),
            unit_number: "TRL0001".to_string(),
            destination: Destination::Haugesund,
            departure_time: "12:00".parse().unwrap(),
            gate: "D4".to_string(),
            transport_type: TransportType::Trailer,
            status: Status::Loading,
            comment: None,
        })];
        let backend = FlakyBackend {
            records,
            ..FlakyBackend::default()
        };
        let changes = Arc::clone(&backend.changes);

        Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();
        assert!(changes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_load_reassigns_duplicate_ids() {
        let base = Departure {
            id: DepartureId::new(5),
            unit_number: "TRL0001".to_string(),
            destination: Destination::Haugesund,
            departure_time: "12:00".parse().unwrap(),
            gate: "D4".to_string(),
            transport_type: TransportType::Trailer,
            status: Status::Loading,
            comment: None,
        };
        let mut other = base.clone();
        other.unit_number = "TRL0002".to_string();
        let backend = MemoryBackend::with_records(vec![
            DepartureRecord::from(&base),
            DepartureRecord::from(&other),
        ]);

        let registry = Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();
        assert_eq!(registry.all()[0].id, DepartureId::new(5));
        assert!(registry.all()[1].id > DepartureId::new(5));
    }

    #[test]
    fn test_load_rejects_unknown_labels() {
        let mut record = DepartureRecord::from(&Departure {
            id: DepartureId::new(5),
            unit_number: "TRL0001".to_string(),
            destination: Destination::Haugesund,
            departure_time: "12:00".parse().unwrap(),
            gate: "D4".to_string(),
            transport_type: TransportType::Trailer,
            status: Status::Loading,
            comment: None,
        });
        record.status = "Lost".to_string();

        let err = Registry::with_backend(
            Box::new(MemoryBackend::with_records(vec![record])),
            UnitRules::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::StorageCorrupt { .. }));
    }

    #[test]
    fn test_import_rejects_whole_payload() {
        let mut registry = Registry::in_memory();
        registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();

        let payload = r#"[
            {"unitNumber": "TOG2222", "destination": "MOLDE", "time": "09:00",
             "gate": "A1", "type": "Train", "status": "Planned"},
            {"unitNumber": "TOG3333", "destination": "MOLDE"}
        ]"#;
        let err = registry.import(payload, Some(ImportPolicy::Replace)).unwrap_err();
        assert!(matches!(err, Error::InvalidImportPayload { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all()[0].unit_number, "TOG1234");
    }

    #[test]
    fn test_import_uses_configured_policy() {
        let mut registry = Registry::in_memory().with_import_policy(ImportPolicy::Replace);
        registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();

        let payload = r#"[{"unitNumber": "BIL5678", "destination": "MOLDE", "time": "09:00",
            "gate": "A1", "type": "Truck", "status": "Planlagt"}]"#;
        let summary = registry.import(payload, None).unwrap();
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.added, 1);
        assert_eq!(registry.all()[0].status, Status::Planned);
    }

    #[test]
    fn test_import_ignores_unit_pattern() {
        let mut registry = Registry::in_memory();
        let payload = r#"[{"unitNumber": "X1", "destination": "MOLDE", "time": "09:00",
            "gate": "A1", "type": "Truck", "status": "Planned"}]"#;
        assert_eq!(registry.import(payload, None).unwrap().added, 1);
    }

    #[test]
    fn test_seed_skips_existing() {
        let mut registry = Registry::in_memory();
        registry.add(&input("TOG1002", Destination::Molde, "08:00")).unwrap();

        let summary = registry.seed().unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(registry.get_by_unit("tog1003").unwrap().departure_time.to_string(), "08:30");

        assert_eq!(registry.seed().unwrap().added, 0);
    }

    #[test]
    fn test_export_applies_filter() {
        let mut registry = Registry::in_memory().with_csv_options(CsvOptions {
            delimiter: b',',
            bom: false,
        });
        registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();
        registry.add(&input("TOG5678", Destination::Forde, "09:00")).unwrap();

        let bytes = registry
            .export(ExportFormat::Csv, &Filter::all().destination(Destination::Forde))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("TOG5678,FØRDE,09:00"));
    }

    #[test]
    fn test_stats_follow_filter() {
        let mut registry = Registry::in_memory();
        registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();
        registry.add(&input("TOG5678", Destination::Forde, "09:00")).unwrap();

        assert_eq!(registry.stats(&Filter::all()).total, 2);
        let stats = registry.stats(&Filter::all().search("5678"));
        assert_eq!(stats.total, 1);
        assert_eq!(stats.top_destination, Some(Destination::Forde));
    }

    #[test]
    fn test_sqlite_registry_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avganger.db");

        let id = {
            let backend = SqliteBackend::open(&path).unwrap();
            let mut registry =
                Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();
            registry.add(&input("TOG1234", Destination::Molde, "08:00")).unwrap();
            let second = registry.add(&input("TOG5678", Destination::Molde, "09:00")).unwrap();
            registry.delete(second.id).unwrap();
            registry.all()[0].id
        };

        let backend = SqliteBackend::open(&path).unwrap();
        let registry = Registry::with_backend(Box::new(backend), UnitRules::default()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all()[0].id, id);
        assert_eq!(registry.backend_name(), "sqlite");
    }
}
