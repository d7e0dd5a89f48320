//! Sequences the per-email editing protocol: acquire, load and reconcile,
//! save while holding the lock, release.
//!
//! Storage failures are returned as they happen; retrying is up to the
//! client. A lock taken during `open_for_edit` stays taken even when loading
//! fails afterwards, and is only given back by `close` or an administrator.

use crate::editor::lock::LockManager;
use crate::editor::parser::parse_template_html;
use crate::editor::reconciler::{add_section, build_initial_content, normalize_existing};
use crate::editor::validation::{parse_submitted_content, validate_document, validate_values};
use crate::errors::EditorError;
use crate::identity::Identity;
use crate::storage::{EditorStore, LockCondition, NewEmail};
use common::model::content::{ContentDocument, ContentMap};
use common::model::email::{EmailRecord, EmailSummary, LockState, LockStatus};
use common::responses::{EditMode, OpenedEmail};
use log::{debug, info, warn};
use serde_json::Value;
use uuid::Uuid;

pub struct EditingSession<'a, S> {
    store: &'a S,
    locks: LockManager<'a, S>,
}

impl<'a, S> EditingSession<'a, S>
where
    S: EditorStore,
{
    pub fn new(store: &'a S) -> Self {
        EditingSession {
            store,
            locks: LockManager::new(store),
        }
    }

    pub fn list_emails(&self) -> Result<Vec<EmailSummary>, EditorError> {
        Ok(self.store.list_emails()?)
    }

    /// Creates an email from a template. The creator holds the lock of the
    /// new email.
    pub fn create_email(
        &self,
        identity: &Identity,
        template_id: i64,
        initial_values: &ContentMap,
    ) -> Result<String, EditorError> {
        self.remember(identity);
        let html = self.template_html(template_id)?;
        validate_values(initial_values)?;

        let content = build_initial_content(parse_template_html(&html), initial_values);
        let uuid = Uuid::new_v4().to_string();
        self.store.insert_email(&NewEmail {
            uuid: &uuid,
            template_id,
            content: &content,
            user_id: identity.user_id,
            lock: LockState::LockedBy(identity.user_id),
        })?;
        info!(
            "Email {} created from template {} by user {} ({} sections)",
            uuid,
            template_id,
            identity.user_id,
            content.sections.len()
        );
        Ok(uuid)
    }

    /// Acquires the lock and loads the reconciled document.
    ///
    /// An elevated requester who loses the lock race still gets the document,
    /// read-only; anyone else gets the conflict.
    pub fn open_for_edit(&self, uuid: &str, identity: &Identity) -> Result<OpenedEmail, EditorError> {
        self.remember(identity);
        let (mode, holder_id, holder_name) = match self.locks.acquire(uuid, identity.user_id) {
            Ok(()) => (EditMode::Editable, Some(identity.user_id), None),
            Err(EditorError::LockConflict {
                holder_id,
                holder_name,
            }) if identity.is_elevated() => {
                info!(
                    "Admin {} opening email {} read-only (locked by {:?})",
                    identity.user_id, uuid, holder_id
                );
                (EditMode::ReadOnly, holder_id, holder_name)
            }
            Err(e) => return Err(e),
        };

        let record = self.email(uuid)?;
        let normalized = normalize_existing(record.template_id, &record.content, |id| {
            self.template_html(id)
        })?;

        if normalized.was_upgraded() && mode == EditMode::Editable {
            let written = self.store.update_content(
                uuid,
                normalized.document(),
                identity.user_id,
                LockCondition::HeldBy(identity.user_id),
            )?;
            if written {
                info!("Email {} upgraded from legacy content", uuid);
            } else {
                warn!("Email {} lost its lock before the legacy upgrade was stored", uuid);
            }
        }

        let holder_name = match (mode, holder_id) {
            (EditMode::Editable, Some(holder)) => self.store.display_name(holder)?,
            _ => holder_name,
        };

        Ok(OpenedEmail {
            uuid: record.uuid,
            template_id: record.template_id,
            template_name: record.template_name,
            mode,
            locked_by_user_id: holder_id,
            locked_by_username: holder_name,
            content: normalized.into_document(),
            section_library: self.store.list_available_sections()?,
        })
    }

    /// Replaces the stored document. The lock is re-checked here and again by
    /// the write itself.
    pub fn save(&self, uuid: &str, identity: &Identity, submitted: &Value) -> Result<(), EditorError> {
        self.remember(identity);
        self.require_holder(uuid, identity)?;
        let document = parse_submitted_content(submitted)?;
        validate_document(&document)?;
        self.write_content(uuid, identity, &document)?;
        debug!("Email {} saved by user {}", uuid, identity.user_id);
        Ok(())
    }

    /// Appends a section from the library and stores the grown document.
    pub fn add_section(
        &self,
        uuid: &str,
        identity: &Identity,
        section_template_id: i64,
    ) -> Result<ContentDocument, EditorError> {
        self.require_holder(uuid, identity)?;
        let section_template = self
            .store
            .get_section_template(section_template_id)?
            .ok_or_else(|| EditorError::not_found("Plantilla de sección no encontrada."))?;

        let record = self.email(uuid)?;
        let mut document = normalize_existing(record.template_id, &record.content, |id| {
            self.template_html(id)
        })?
        .into_document();
        let added = add_section(
            &mut document,
            &section_template.type_key,
            &section_template.html_content,
        );
        info!(
            "Section '{}' added to email {} with {} fields",
            section_template.type_key,
            uuid,
            added.content.len()
        );

        self.write_content(uuid, identity, &document)?;
        Ok(document)
    }

    /// Best-effort release when the editor is left. Never fails: a lock held
    /// by someone else is left alone and errors are only logged.
    pub fn close(&self, uuid: &str, identity: &Identity) {
        match self.locks.release(uuid, identity.user_id) {
            Ok(()) => debug!("Email {} closed by user {}", uuid, identity.user_id),
            Err(EditorError::Forbidden(_)) => debug!(
                "User {} closed email {} without holding its lock",
                identity.user_id, uuid
            ),
            Err(e) => warn!("Could not release lock on email {}: {}", uuid, e),
        }
    }

    pub fn acquire(&self, uuid: &str, identity: &Identity) -> Result<(), EditorError> {
        self.remember(identity);
        self.locks.acquire(uuid, identity.user_id)
    }

    pub fn release(&self, uuid: &str, identity: &Identity) -> Result<(), EditorError> {
        self.locks.release(uuid, identity.user_id)
    }

    pub fn lock_status(&self, uuid: &str) -> Result<LockStatus, EditorError> {
        self.locks.status(uuid)
    }

    pub fn force_release(&self, uuid: &str, identity: &Identity) -> Result<(), EditorError> {
        require_elevated(identity)?;
        self.locks.force_release(uuid)?;
        info!("Admin {} force-released email {}", identity.user_id, uuid);
        Ok(())
    }

    /// Force-release followed by a full `open_for_edit`; someone may still
    /// win the lock in between.
    pub fn take_over(&self, uuid: &str, identity: &Identity) -> Result<OpenedEmail, EditorError> {
        self.force_release(uuid, identity)?;
        self.open_for_edit(uuid, identity)
    }

    /// Deletes an email that is free or locked by the requester.
    pub fn delete_email(&self, uuid: &str, identity: &Identity) -> Result<(), EditorError> {
        if let LockState::LockedBy(holder) = self.locks.check_lock(uuid)? {
            if holder != identity.user_id {
                return Err(self.locks.conflict(Some(holder))?);
            }
        }

        let deleted = self
            .store
            .delete_email(uuid, LockCondition::FreeOrHeldBy(identity.user_id))?;
        if deleted {
            info!("Email {} deleted by user {}", uuid, identity.user_id);
            return Ok(());
        }
        match self.store.get_lock_state(uuid)? {
            None => Err(EditorError::not_found("Correo no encontrado para eliminar.")),
            Some(state) => Err(self.locks.conflict(state.holder())?),
        }
    }

    /// Refreshes the requester's directory row when the identity carries a
    /// username. Failures only cost display names, so they are logged.
    fn remember(&self, identity: &Identity) {
        let Some(username) = identity.username.as_deref() else {
            return;
        };
        if let Err(e) = self
            .store
            .remember_user(identity.user_id, username, identity.role)
        {
            warn!("Could not record user {} as '{}': {}", identity.user_id, username, e);
        }
    }

    fn require_holder(&self, uuid: &str, identity: &Identity) -> Result<(), EditorError> {
        if self.locks.check_lock(uuid)?.is_held_by(identity.user_id) {
            Ok(())
        } else {
            Err(lock_required())
        }
    }

    fn write_content(
        &self,
        uuid: &str,
        identity: &Identity,
        document: &ContentDocument,
    ) -> Result<(), EditorError> {
        let written = self.store.update_content(
            uuid,
            document,
            identity.user_id,
            LockCondition::HeldBy(identity.user_id),
        )?;
        if written {
            Ok(())
        } else {
            Err(lock_required())
        }
    }

    fn email(&self, uuid: &str) -> Result<EmailRecord, EditorError> {
        self.store
            .get_email(uuid)?
            .ok_or_else(|| EditorError::not_found("Correo editable no encontrado."))
    }

    fn template_html(&self, template_id: i64) -> Result<String, EditorError> {
        self.store
            .get_template_html(template_id)?
            .ok_or_else(|| EditorError::not_found("Template no encontrado."))
    }
}

fn lock_required() -> EditorError {
    EditorError::forbidden("No tienes el bloqueo para guardar este correo.")
}

pub fn require_elevated(identity: &Identity) -> Result<(), EditorError> {
    if identity.is_elevated() {
        Ok(())
    } else {
        Err(EditorError::forbidden(
            "No tienes permiso de administrador para realizar esta acción.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStore, TemplateStore};
    use common::model::content::LEGACY_SECTION_TYPE;
    use common::model::user::Role;
    use serde_json::json;
    use tempfile::TempDir;

    const ANA: Identity = Identity {
        user_id: 1,
        role: Role::Editor,
        username: None,
    };
    const LUIS: Identity = Identity {
        user_id: 2,
        role: Role::Editor,
        username: None,
    };
    const ADMIN: Identity = Identity {
        user_id: 3,
        role: Role::Admin,
        username: None,
    };

    const TEMPLATE: &str = r#"<html><body>
<table data-section-type="promo"><tr><td>
  <h1>{{titulo}}</h1><a href="{{enlace_1}}">Ver</a><img src="producto.png">
</td></tr></table>
</body></html>"#;

    fn setup() -> (TempDir, SqliteStore, i64) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("session.sqlite")).unwrap();
        store.insert_user(1, "ana", "editor").unwrap();
        store.insert_user(2, "luis", "editor").unwrap();
        store.insert_user(3, "root", "admin").unwrap();
        let template_id = store.insert_template("Promo", TEMPLATE, 3).unwrap();
        (dir, store, template_id)
    }

    fn with_link(document: &ContentDocument, link: &str) -> Value {
        let mut document = document.clone();
        document.sections[0]
            .content
            .insert("enlace_1".into(), link.into());
        serde_json::to_value(document).unwrap()
    }

    #[test]
    fn create_then_save_validates_links() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);

        let mut initial = ContentMap::new();
        initial.insert("titulo".into(), "<p>Rebajas</p>".into());
        let uuid = session.create_email(&ANA, template_id, &initial).unwrap();

        let opened = session.open_for_edit(&uuid, &ANA).unwrap();
        assert_eq!(opened.mode, EditMode::Editable);
        let content = &opened.content.sections[0].content;
        let keys: Vec<_> = content.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["titulo", "enlace_1", "image_0"]);
        assert_eq!(content["titulo"], "<p>Rebajas</p>");
        assert_eq!(content["enlace_1"], "");

        let rejected = session.save(&uuid, &ANA, &with_link(&opened.content, "not a url"));
        assert!(matches!(rejected, Err(EditorError::ValidationFailed(_))));

        let accepted = with_link(&opened.content, "https://example.com");
        session.save(&uuid, &ANA, &accepted).unwrap();
        session.save(&uuid, &ANA, &accepted).unwrap();
        assert_eq!(store.raw_content(&uuid).unwrap(), accepted);
    }

    #[test]
    fn creation_rejects_bad_initial_values_and_unknown_templates() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);

        let mut initial = ContentMap::new();
        initial.insert("enlace_1".into(), "ftp//roto".into());
        assert!(matches!(
            session.create_email(&ANA, template_id, &initial),
            Err(EditorError::ValidationFailed(_))
        ));
        assert!(matches!(
            session.create_email(&ANA, 999, &ContentMap::new()),
            Err(EditorError::NotFound(_))
        ));
        assert!(session.list_emails().unwrap().is_empty());
    }

    #[test]
    fn conflicting_open_stops_ordinary_users() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);
        let uuid = session.create_email(&ANA, template_id, &ContentMap::new()).unwrap();

        match session.open_for_edit(&uuid, &LUIS) {
            Err(EditorError::LockConflict { holder_name, .. }) => {
                assert_eq!(holder_name.as_deref(), Some("ana"))
            }
            other => panic!("expected conflict, got {:?}", other.map(|o| o.mode)),
        }
    }

    #[test]
    fn admin_reads_locked_email_without_saving() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);
        let uuid = session.create_email(&ANA, template_id, &ContentMap::new()).unwrap();

        let opened = session.open_for_edit(&uuid, &ADMIN).unwrap();
        assert_eq!(opened.mode, EditMode::ReadOnly);
        assert_eq!(opened.locked_by_username.as_deref(), Some("ana"));
        assert_eq!(opened.content.sections.len(), 1);

        let attempt = session.save(&uuid, &ADMIN, &with_link(&opened.content, "https://a.es"));
        assert!(matches!(attempt, Err(EditorError::Forbidden(_))));
        assert_eq!(
            session.lock_status(&uuid).unwrap().locked_by_user_id,
            Some(ANA.user_id)
        );
    }

    #[test]
    fn legacy_content_is_upgraded_and_written_back() {
        let (_dir, store, template_id) = setup();
        store
            .insert_raw_email("legado", template_id, r#"{"titulo":"Hola"}"#, 1)
            .unwrap();
        let session = EditingSession::new(&store);

        let opened = session.open_for_edit("legado", &ANA).unwrap();
        let section = &opened.content.sections[0];
        assert_eq!(section.section_type, LEGACY_SECTION_TYPE);
        assert_eq!(section.html, TEMPLATE);
        assert_eq!(section.content["titulo"], "Hola");

        let stored = store.raw_content("legado").unwrap();
        assert_eq!(stored["sections"][0]["type"], LEGACY_SECTION_TYPE);
        assert_eq!(stored["sections"][0]["id"], json!(section.id));
    }

    #[test]
    fn read_only_open_does_not_rewrite_legacy_content() {
        let (_dir, store, template_id) = setup();
        store
            .insert_raw_email("legado", template_id, r#"{"titulo":"Hola"}"#, 1)
            .unwrap();
        let session = EditingSession::new(&store);
        session.acquire("legado", &ANA).unwrap();

        let opened = session.open_for_edit("legado", &ADMIN).unwrap();
        assert_eq!(opened.mode, EditMode::ReadOnly);
        assert_eq!(store.raw_content("legado").unwrap(), json!({ "titulo": "Hola" }));
    }

    #[test]
    fn failed_load_keeps_the_lock() {
        let (_dir, store, _) = setup();
        let doomed = store.insert_template("Efímero", TEMPLATE, 3).unwrap();
        store
            .insert_raw_email("huerfano", doomed, r#"{"titulo":"Hola"}"#, 1)
            .unwrap();
        store.remove_template_unchecked(doomed).unwrap();
        let session = EditingSession::new(&store);

        assert!(matches!(
            session.open_for_edit("huerfano", &LUIS),
            Err(EditorError::NotFound(_))
        ));
        assert_eq!(
            session.lock_status("huerfano").unwrap().locked_by_user_id,
            Some(LUIS.user_id)
        );
    }

    #[test]
    fn users_unknown_to_the_directory_can_edit() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);
        let stranger = Identity::new(42, Role::Editor);

        let uuid = session
            .create_email(&stranger, template_id, &ContentMap::new())
            .unwrap();
        session.acquire(&uuid, &stranger).unwrap();
        let opened = session.open_for_edit(&uuid, &stranger).unwrap();
        assert_eq!(opened.mode, EditMode::Editable);
        assert_eq!(opened.locked_by_username, None);
        session
            .save(&uuid, &stranger, &with_link(&opened.content, "https://example.com"))
            .unwrap();

        match session.open_for_edit(&uuid, &LUIS) {
            Err(e @ EditorError::LockConflict { .. }) => {
                assert!(e.to_string().contains(crate::errors::UNKNOWN_HOLDER))
            }
            other => panic!("expected conflict, got {:?}", other.map(|o| o.mode)),
        }
    }

    #[test]
    fn named_identities_are_recorded_for_display() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);
        let marta = Identity::new(42, Role::Editor).with_username("marta");

        let uuid = session.create_email(&marta, template_id, &ContentMap::new()).unwrap();
        let opened = session.open_for_edit(&uuid, &marta).unwrap();
        assert_eq!(opened.locked_by_username.as_deref(), Some("marta"));
        assert_eq!(
            session.list_emails().unwrap()[0].creator_username.as_deref(),
            Some("marta")
        );
    }

    #[test]
    fn close_releases_only_own_lock() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);
        let uuid = session.create_email(&ANA, template_id, &ContentMap::new()).unwrap();

        session.close(&uuid, &LUIS);
        assert!(session.lock_status(&uuid).unwrap().is_locked);
        session.close(&uuid, &ANA);
        assert!(!session.lock_status(&uuid).unwrap().is_locked);
        session.close(&uuid, &ANA);
        session.close("no-existe", &ANA);
    }

    #[test]
    fn take_over_requires_admin_and_reacquires() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);
        let uuid = session.create_email(&ANA, template_id, &ContentMap::new()).unwrap();

        assert!(matches!(
            session.take_over(&uuid, &LUIS),
            Err(EditorError::Forbidden(_))
        ));
        assert!(matches!(
            session.force_release(&uuid, &LUIS),
            Err(EditorError::Forbidden(_))
        ));

        let opened = session.take_over(&uuid, &ADMIN).unwrap();
        assert_eq!(opened.mode, EditMode::Editable);
        assert_eq!(opened.locked_by_user_id, Some(ADMIN.user_id));
        assert!(matches!(
            session.save(&uuid, &ANA, &serde_json::to_value(&opened.content).unwrap()),
            Err(EditorError::Forbidden(_))
        ));
    }

    #[test]
    fn delete_is_blocked_by_another_holder() {
        let (_dir, store, template_id) = setup();
        let session = EditingSession::new(&store);
        let uuid = session.create_email(&ANA, template_id, &ContentMap::new()).unwrap();

        assert!(matches!(
            session.delete_email(&uuid, &LUIS),
            Err(EditorError::LockConflict { .. })
        ));
        session.delete_email(&uuid, &ANA).unwrap();
        assert!(matches!(
            session.delete_email(&uuid, &ANA),
            Err(EditorError::NotFound(_))
        ));
    }

    #[test]
    fn added_section_is_appended_and_stored() {
        let (_dir, store, template_id) = setup();
        let gallery = store
            .insert_section_template(
                "Galería",
                "galeria",
                r#"<table data-section-type="galeria"><tr><td><img src="a"><img src="b"></td></tr></table>"#,
            )
            .unwrap();
        let session = EditingSession::new(&store);
        let uuid = session.create_email(&ANA, template_id, &ContentMap::new()).unwrap();

        assert!(matches!(
            session.add_section(&uuid, &LUIS, gallery),
            Err(EditorError::Forbidden(_))
        ));
        assert!(matches!(
            session.add_section(&uuid, &ANA, 404),
            Err(EditorError::NotFound(_))
        ));

        let document = session.add_section(&uuid, &ANA, gallery).unwrap();
        assert_eq!(document.sections.len(), 2);
        let keys: Vec<_> = document.sections[1].content.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["image_1", "image_2"]);
        assert_eq!(
            store.raw_content(&uuid).unwrap(),
            serde_json::to_value(&document).unwrap()
        );

        let opened = session.open_for_edit(&uuid, &ANA).unwrap();
        assert_eq!(opened.section_library.len(), 1);
        assert_eq!(opened.content, document);
    }
}
