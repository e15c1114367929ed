//! In-memory [`FormStore`].

use std::sync::{Mutex, MutexGuard};

use forms_core::schema::FormSchema;

use crate::error::{Result, StorageError};
use crate::traits::{FormStore, prepare_new, prepare_update};

/// A [`FormStore`] holding schemas in a vector. Nothing survives a drop.
#[derive(Debug, Default)]
pub struct MemoryFormStore {
    forms: Mutex<Vec<FormSchema>>,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn forms(&self) -> MutexGuard<'_, Vec<FormSchema>> {
        // A panic mid-edit leaves the vector whole, so poisoning is ignored.
        self.forms.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FormStore for MemoryFormStore {
    fn save(&self, schema: &FormSchema) -> Result<String> {
        let mut forms = self.forms();
        if forms.iter().any(|s| s.id == schema.id && !schema.id.is_empty()) {
            return Err(StorageError::AlreadyExists {
                id: schema.id.clone(),
            });
        }
        let stored = prepare_new(schema, &forms);
        let id = stored.id.clone();
        forms.push(stored);
        Ok(id)
    }

    fn load_all(&self) -> Result<Vec<FormSchema>> {
        Ok(self.forms().clone())
    }

    fn get(&self, id: &str) -> Result<FormSchema> {
        self.forms()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StorageError::form_not_found(id))
    }

    fn update(&self, id: &str, schema: &FormSchema) -> Result<()> {
        let mut forms = self.forms();
        let slot = forms
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StorageError::form_not_found(id))?;
        *slot = prepare_update(slot, schema);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut forms = self.forms();
        let before = forms.len();
        forms.retain(|s| s.id != id);
        if forms.len() == before {
            return Err(StorageError::form_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forms_core::field::FieldBuilder;
    use pretty_assertions::assert_eq;

    fn unsaved(name: &str) -> FormSchema {
        FormSchema {
            id: String::new(),
            name: name.to_string(),
            fields: vec![FieldBuilder::new("f1", "Name").build()],
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }

    #[test]
    fn save_assigns_ids_and_timestamps() {
        let store = MemoryFormStore::new();
        let a = store.save(&unsaved("Signup")).unwrap();
        let b = store.save(&unsaved("Signup")).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("form-"));

        let loaded = store.get(&a).unwrap();
        assert_eq!(loaded.name, "Signup");
        assert!(loaded.created_at > chrono::DateTime::<chrono::Utc>::default());
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn save_keeps_explicit_id_and_rejects_duplicates() {
        let store = MemoryFormStore::new();
        let mut schema = unsaved("Fixed");
        schema.id = "form-fixed".into();
        assert_eq!(store.save(&schema).unwrap(), "form-fixed");
        assert!(matches!(
            store.save(&schema),
            Err(StorageError::AlreadyExists { id }) if id == "form-fixed"
        ));
    }

    #[test]
    fn update_keeps_identity() {
        let store = MemoryFormStore::new();
        let id = store.save(&unsaved("Old")).unwrap();
        let created = store.get(&id).unwrap().created_at;

        let mut edited = unsaved("New");
        edited.id = "ignored".into();
        store.update(&id, &edited).unwrap();

        let loaded = store.get(&id).unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "New");
        assert_eq!(loaded.created_at, created);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let store = MemoryFormStore::new();
        assert!(store.get("form-x").unwrap_err().is_not_found());
        assert!(store.update("form-x", &unsaved("X")).unwrap_err().is_not_found());
        assert!(store.delete("form-x").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_removes() {
        let store = MemoryFormStore::new();
        let id = store.save(&unsaved("Gone")).unwrap();
        store.delete(&id).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }
}
