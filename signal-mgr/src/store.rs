//! Runtime signal store
//!
//! Holds the current value of every declared signal. Writes are checked
//! against the declared type, and a write that does not change the stored
//! value is a no-op: the revision stays the same and no subscriber is called.

use crate::signals::validation::check_layout;
use crate::signals::{SignalDatabase, SignalDefinition, SignalType};
use crate::types::{FieldValue, Result, SignalError, SignalValue, Timestamp};
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Handle returned by [`SignalStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A change delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct SignalChange {
    pub name: String,
    pub old_value: SignalValue,
    pub new_value: SignalValue,
    /// Revision of the signal after this change
    pub revision: u64,
    pub timestamp: Timestamp,
}

type Callback = Box<dyn FnMut(&SignalChange)>;

struct SignalSlot {
    definition: SignalDefinition,
    value: SignalValue,
    revision: u64,
    last_changed: Option<Timestamp>,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

/// Current values of declared signals
pub struct SignalStore {
    slots: IndexMap<String, SignalSlot>,
    /// Signals changed since the last `take_changes`, in first-change order
    dirty: IndexSet<String>,
    next_subscription: u64,
}

impl SignalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
            dirty: IndexSet::new(),
            next_subscription: 0,
        }
    }

    /// Create a store holding every signal of a database
    ///
    /// The database must pass validation.
    pub fn from_database(db: &SignalDatabase) -> Result<Self> {
        let issues = db.validate();
        if !issues.is_empty() {
            return Err(SignalError::Validation(issues));
        }

        let mut store = Self::new();
        for signal in db.signals() {
            store.declare(signal.clone())?;
        }
        log::debug!("Signal store created with {} signals", store.len());
        Ok(store)
    }

    /// Declare a signal; its value starts at the signal's init value
    ///
    /// A type with repeated or missing fields, or an array without elements,
    /// is rejected with [`SignalError::Validation`].
    pub fn declare(&mut self, definition: SignalDefinition) -> Result<()> {
        if self.slots.contains_key(&definition.name) {
            return Err(SignalError::DuplicateSignal(definition.name));
        }
        let issues = check_layout(&definition);
        if !issues.is_empty() {
            return Err(SignalError::Validation(issues));
        }
        let value = definition.initial_value()?;
        log::trace!("Declared '{}' = {}", definition.name, value);
        self.slots.insert(
            definition.name.clone(),
            SignalSlot {
                definition,
                value,
                revision: 0,
                last_changed: None,
                subscribers: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Declared signal names in declaration order
    pub fn signal_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn definition(&self, name: &str) -> Result<&SignalDefinition> {
        self.slot(name).map(|slot| &slot.definition)
    }

    /// Declared type of a signal
    pub fn signal_type(&self, name: &str) -> Result<&SignalType> {
        self.slot(name).map(|slot| &slot.definition.signal_type)
    }

    /// Current value of a signal
    pub fn get(&self, name: &str) -> Result<SignalValue> {
        self.slot(name).map(|slot| slot.value.clone())
    }

    /// Write a signal value
    ///
    /// Returns `true` if the stored value changed. Values are compared by
    /// their bit patterns, so `0.0` and `-0.0` differ as they do for the
    /// generated `memcmp`. A value outside the declared type's domain is
    /// rejected and the stored value is kept.
    pub fn set(&mut self, name: &str, value: SignalValue) -> Result<bool> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| SignalError::SignalNotFound(name.to_string()))?;

        let value = slot.definition.signal_type.coerce(name, &value)?;
        if value.bitwise_eq(&slot.value) {
            log::trace!("'{}' unchanged", name);
            return Ok(false);
        }

        let timestamp = chrono::Utc::now();
        let old_value = std::mem::replace(&mut slot.value, value);
        slot.revision += 1;
        slot.last_changed = Some(timestamp);
        log::trace!("'{}': {} -> {} (rev {})", name, old_value, slot.value, slot.revision);

        self.dirty.insert(name.to_string());

        if !slot.subscribers.is_empty() {
            let change = SignalChange {
                name: name.to_string(),
                old_value,
                new_value: slot.value.clone(),
                revision: slot.revision,
                timestamp,
            };
            for (_, callback) in slot.subscribers.iter_mut() {
                callback(&change);
            }
        }
        Ok(true)
    }

    /// Read one field of a structure signal
    pub fn get_field(&self, name: &str, field: &str) -> Result<SignalValue> {
        let slot = self.slot(name)?;
        slot.value
            .field(field)
            .cloned()
            .ok_or_else(|| SignalError::FieldNotFound {
                signal: name.to_string(),
                field: field.to_string(),
            })
    }

    /// Write one field of a structure signal, keeping the other fields
    pub fn set_field(&mut self, name: &str, field: &str, value: SignalValue) -> Result<bool> {
        let current = self.slot(name)?;
        let SignalValue::Struct(fields) = &current.value else {
            return Err(SignalError::FieldNotFound {
                signal: name.to_string(),
                field: field.to_string(),
            });
        };
        if !fields.iter().any(|f| f.name == field) {
            return Err(SignalError::FieldNotFound {
                signal: name.to_string(),
                field: field.to_string(),
            });
        }

        let updated = fields
            .iter()
            .map(|f| {
                if f.name == field {
                    FieldValue::new(f.name.clone(), value.clone())
                } else {
                    f.clone()
                }
            })
            .collect();
        self.set(name, SignalValue::Struct(updated))
    }

    /// Number of changes a signal has seen since declaration
    pub fn revision(&self, name: &str) -> Result<u64> {
        self.slot(name).map(|slot| slot.revision)
    }

    /// Time of the last change, `None` if never written
    pub fn last_changed(&self, name: &str) -> Result<Option<Timestamp>> {
        self.slot(name).map(|slot| slot.last_changed)
    }

    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Names of signals changed since the previous call
    pub fn take_changes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    /// Call `callback` after every change of a signal
    ///
    /// Only signals declared with notifiers accept subscribers.
    pub fn subscribe<F>(&mut self, name: &str, callback: F) -> Result<SubscriptionId>
    where
        F: FnMut(&SignalChange) + 'static,
    {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| SignalError::SignalNotFound(name.to_string()))?;
        if !slot.definition.notifiers {
            return Err(SignalError::NotificationsDisabled(name.to_string()));
        }

        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        slot.subscribers.push((id, Box::new(callback)));
        log::debug!("Subscribed to '{}' ({:?})", name, id);
        Ok(id)
    }

    /// Remove a subscription; returns `false` if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for slot in self.slots.values_mut() {
            if let Some(pos) = slot.subscribers.iter().position(|(sub, _)| *sub == id) {
                slot.subscribers.remove(pos);
                return true;
            }
        }
        false
    }

    fn slot(&self, name: &str) -> Result<&SignalSlot> {
        self.slots
            .get(name)
            .ok_or_else(|| SignalError::SignalNotFound(name.to_string()))
    }
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SignalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalStore")
            .field("signals", &self.slots.len())
            .field("pending_changes", &self.dirty.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{InitValue, StructField};
    use crate::types::DataType;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn flags(name: &str) -> SignalDefinition {
        SignalDefinition::new(
            name,
            SignalType::Struct(vec![
                StructField::new("flag_a", DataType::Bool),
                StructField::new("flag_b", DataType::Bool),
            ]),
        )
        .with_notifiers(true)
    }

    fn flags_value(a: bool, b: bool) -> SignalValue {
        SignalValue::Struct(vec![
            FieldValue::new("flag_a", SignalValue::Boolean(a)),
            FieldValue::new("flag_b", SignalValue::Boolean(b)),
        ])
    }

    #[test]
    fn test_declare_initial_values() {
        let mut store = SignalStore::new();
        store.declare(flags("TestDataV1")).unwrap();
        store
            .declare(
                SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt16))
                    .with_init_value(InitValue::Custom("100".to_string())),
            )
            .unwrap();

        assert_eq!(store.get("TestDataV1").unwrap(), flags_value(false, false));
        assert_eq!(store.get("Speed").unwrap(), SignalValue::Unsigned(100));
        assert_eq!(store.revision("Speed").unwrap(), 0);
        assert_eq!(store.last_changed("Speed").unwrap(), None);

        assert!(matches!(
            store.declare(flags("TestDataV1")),
            Err(SignalError::DuplicateSignal(_))
        ));
        assert!(matches!(store.get("Missing"), Err(SignalError::SignalNotFound(_))));
    }

    #[test]
    fn test_get_then_set_is_noop() {
        let mut store = SignalStore::new();
        store.declare(flags("TestDataV1")).unwrap();
        store.declare(flags("TestDataV2")).unwrap();

        let calls = Rc::new(RefCell::new(0));
        for name in ["TestDataV1", "TestDataV2"] {
            let calls = Rc::clone(&calls);
            store
                .subscribe(name, move |_| *calls.borrow_mut() += 1)
                .unwrap();
        }

        store.set("TestDataV2", flags_value(true, false)).unwrap();
        store.take_changes();
        *calls.borrow_mut() = 0;

        for name in ["TestDataV1", "TestDataV2"] {
            let revision = store.revision(name).unwrap();
            let value = store.get(name).unwrap();
            assert!(!store.set(name, value).unwrap());
            assert_eq!(store.revision(name).unwrap(), revision);
        }
        assert_eq!(*calls.borrow(), 0);
        assert!(!store.has_changes());
    }

    #[test]
    fn test_change_notification() {
        let mut store = SignalStore::new();
        store.declare(flags("TestDataV1")).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = store
            .subscribe("TestDataV1", move |change| sink.borrow_mut().push(change.clone()))
            .unwrap();

        assert!(store.set("TestDataV1", flags_value(true, false)).unwrap());
        {
            let seen = seen.borrow();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].old_value, flags_value(false, false));
            assert_eq!(seen[0].new_value, flags_value(true, false));
            assert_eq!(seen[0].revision, 1);
        }
        assert!(store.last_changed("TestDataV1").unwrap().is_some());

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set("TestDataV1", flags_value(true, true)).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(store.revision("TestDataV1").unwrap(), 2);
    }

    #[test]
    fn test_subscribe_requires_notifiers() {
        let mut store = SignalStore::new();
        store
            .declare(SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt16)))
            .unwrap();
        assert!(matches!(
            store.subscribe("Speed", |_| {}),
            Err(SignalError::NotificationsDisabled(_))
        ));
    }

    #[test]
    fn test_rejected_writes_keep_value() {
        let mut store = SignalStore::new();
        store.declare(flags("TestDataV1")).unwrap();
        store
            .declare(SignalDefinition::new("Speed", SignalType::Primitive(DataType::UInt8)))
            .unwrap();
        store.set("Speed", SignalValue::Unsigned(42)).unwrap();

        assert!(matches!(
            store.set("Speed", SignalValue::Unsigned(300)),
            Err(SignalError::OutOfRange { .. })
        ));
        assert!(matches!(
            store.set("Speed", SignalValue::Boolean(true)),
            Err(SignalError::TypeMismatch { .. })
        ));
        assert_eq!(store.get("Speed").unwrap(), SignalValue::Unsigned(42));
        assert_eq!(store.revision("Speed").unwrap(), 1);

        let missing_field = SignalValue::Struct(vec![FieldValue::new(
            "flag_a",
            SignalValue::Boolean(true),
        )]);
        assert!(store.set("TestDataV1", missing_field).is_err());
        assert!(store
            .set_field("TestDataV1", "flag_a", SignalValue::Unsigned(1))
            .is_err());
        assert_eq!(store.get("TestDataV1").unwrap(), flags_value(false, false));
    }

    #[test]
    fn test_field_access() {
        let mut store = SignalStore::new();
        store.declare(flags("TestDataV1")).unwrap();

        assert!(store
            .set_field("TestDataV1", "flag_b", SignalValue::Boolean(true))
            .unwrap());
        assert_eq!(
            store.get_field("TestDataV1", "flag_b").unwrap(),
            SignalValue::Boolean(true)
        );
        assert_eq!(
            store.get_field("TestDataV1", "flag_a").unwrap(),
            SignalValue::Boolean(false)
        );
        assert!(matches!(
            store.get_field("TestDataV1", "flag_c"),
            Err(SignalError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_declare_rejects_malformed_types() {
        let mut store = SignalStore::new();
        let repeated = SignalDefinition::new(
            "TestDataV1",
            crate::accessor::uniform_struct(&["flag_b", "flag_b"], DataType::Bool),
        );
        match store.declare(repeated) {
            Err(SignalError::Validation(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(
                    issues[0].kind,
                    crate::signals::IssueKind::DuplicateField {
                        field: "flag_b".to_string()
                    }
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let empty = SignalDefinition::new("Empty", SignalType::Struct(Vec::new()));
        assert!(matches!(store.declare(empty), Err(SignalError::Validation(_))));
        let no_elements = SignalDefinition::new(
            "Buf",
            SignalType::Array {
                element: DataType::UInt8,
                size: 0,
            },
        );
        assert!(matches!(store.declare(no_elements), Err(SignalError::Validation(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_negative_zero_is_a_change() {
        let mut store = SignalStore::new();
        store
            .declare(SignalDefinition::new("Temp", SignalType::Primitive(DataType::Float32)))
            .unwrap();

        assert!(store.set("Temp", SignalValue::Float(-0.0)).unwrap());
        assert!(!store.set("Temp", SignalValue::Float(-0.0)).unwrap());
        assert!(store.set("Temp", SignalValue::Float(0.0)).unwrap());
        assert_eq!(store.revision("Temp").unwrap(), 2);
    }

    #[test]
    fn test_take_changes() {
        let mut store = SignalStore::new();
        for name in ["A", "B", "C"] {
            store
                .declare(SignalDefinition::new(name, SignalType::Primitive(DataType::SInt32)))
                .unwrap();
        }
        store.set("C", SignalValue::Signed(-1)).unwrap();
        store.set("A", SignalValue::Signed(5)).unwrap();
        store.set("C", SignalValue::Signed(-2)).unwrap();

        assert_eq!(store.take_changes(), vec!["C", "A"]);
        assert!(store.take_changes().is_empty());
    }

    #[test]
    fn test_from_database_requires_valid() {
        let mut db = SignalDatabase::new();
        db.add_signal(SignalDefinition::new(
            "TestDataV1",
            SignalType::Struct(vec![
                StructField::new("flag_b", DataType::Bool),
                StructField::new("flag_b", DataType::Bool),
            ]),
        ))
        .unwrap();

        match SignalStore::from_database(&db) {
            Err(SignalError::Validation(issues)) => assert_eq!(issues.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
