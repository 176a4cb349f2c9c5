//! In-process store.
//!
//! Mirrors the `PostgreSQL` schema's constraints (unique subject, email and
//! token; restrictive foreign keys) so handlers behave the same against
//! either backend.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tally_core::{
    ClientId, CompanyId, InviteId, InviteStatus, MemberId, ProjectId, Role, SubjectId,
    TimeEntryDraft, TimeEntryId, TimeEntryStatus,
};

use super::{
    ClientRepository, CompanyRepository, InviteRepository, MemberRepository, ProjectRepository,
    RepositoryError, Store, TimeEntryRepository,
};
use crate::models::{
    Client, ClientChanges, Company, CompanyChanges, Invite, Member, MemberChanges, MemberProfile,
    NewCompany, NewInvite, NewMember, Project, ProjectChanges, StatusChange, TimeEntry,
    TimeEntryFilter,
};

#[derive(Debug, Default)]
struct Tables {
    next_id: i32,
    companies: Vec<Company>,
    members: Vec<Member>,
    clients: Vec<Client>,
    projects: Vec<Project>,
    time_entries: Vec<TimeEntry>,
    invites: Vec<Invite>,
}

impl Tables {
    /// One sequence shared by every table; ids only need to be unique per table.
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_member(&mut self, member: NewMember) -> Result<Member, RepositoryError> {
        if self
            .members
            .iter()
            .any(|m| m.subject == member.subject || m.email == member.email)
        {
            return Err(RepositoryError::Conflict(
                "a member with this subject or email already exists".to_owned(),
            ));
        }
        if !self.companies.iter().any(|c| c.id == member.company_id) {
            return Err(RepositoryError::Conflict("company does not exist".to_owned()));
        }

        let now = Utc::now();
        let created = Member {
            id: MemberId::new(self.next_id()),
            subject: member.subject,
            company_id: member.company_id,
            email: member.email,
            first_name: member.first_name,
            last_name: member.last_name,
            role: member.role,
            manager_id: member.manager_id,
            created_at: now,
            updated_at: now,
        };
        self.members.push(created.clone());
        Ok(created)
    }

    fn member_is_referenced(&self, id: MemberId) -> bool {
        self.time_entries.iter().any(|e| {
            e.member_id == id || e.created_by == id || e.updated_by == id || e.approved_by == Some(id)
        }) || self.invites.iter().any(|i| i.invited_by == id)
    }
}

/// Store that keeps every table in memory behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        founder: MemberProfile,
    ) -> Result<(Company, Member), RepositoryError> {
        let mut tables = self.tables();
        if tables
            .members
            .iter()
            .any(|m| m.subject == founder.subject || m.email == founder.email)
        {
            return Err(RepositoryError::Conflict(
                "a member with this subject or email already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let created = Company {
            id: CompanyId::new(tables.next_id()),
            name: company.name,
            address: company.address,
            contact_name: company.contact_name,
            contact_email: company.contact_email,
            contact_phone: company.contact_phone,
            created_at: now,
            updated_at: now,
        };
        tables.companies.push(created.clone());
        let admin = tables.insert_member(founder.join(created.id, Role::Admin))?;

        Ok((created, admin))
    }

    async fn get_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.tables().companies.iter().find(|c| c.id == id).cloned())
    }

    async fn update_company(
        &self,
        id: CompanyId,
        changes: CompanyChanges,
    ) -> Result<Company, RepositoryError> {
        let mut tables = self.tables();
        let company = tables
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        changes.apply(company);
        company.updated_at = Utc::now();
        Ok(company.clone())
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn find_member_by_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<Member>, RepositoryError> {
        Ok(self
            .tables()
            .members
            .iter()
            .find(|m| &m.subject == subject)
            .cloned())
    }

    async fn get_member(
        &self,
        company_id: CompanyId,
        id: MemberId,
    ) -> Result<Option<Member>, RepositoryError> {
        Ok(self
            .tables()
            .members
            .iter()
            .find(|m| m.id == id && m.company_id == company_id)
            .cloned())
    }

    async fn list_members(&self, company_id: CompanyId) -> Result<Vec<Member>, RepositoryError> {
        let mut members: Vec<Member> = self
            .tables()
            .members
            .iter()
            .filter(|m| m.company_id == company_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(members)
    }

    async fn create_member(&self, member: NewMember) -> Result<Member, RepositoryError> {
        self.tables().insert_member(member)
    }

    async fn update_member(
        &self,
        company_id: CompanyId,
        id: MemberId,
        changes: MemberChanges,
    ) -> Result<Member, RepositoryError> {
        let mut tables = self.tables();
        if let Some(manager_id) = changes.manager_id
            && !tables.members.iter().any(|m| m.id == manager_id)
        {
            return Err(RepositoryError::Conflict("manager does not exist".to_owned()));
        }
        let member = tables
            .members
            .iter_mut()
            .find(|m| m.id == id && m.company_id == company_id)
            .ok_or(RepositoryError::NotFound)?;
        changes.apply(member);
        member.updated_at = Utc::now();
        let updated = member.clone();

        if updated.role < Role::Manager {
            for report in tables.members.iter_mut().filter(|m| m.manager_id == Some(id)) {
                report.manager_id = None;
                report.updated_at = updated.updated_at;
            }
        }
        Ok(updated)
    }

    async fn delete_member(
        &self,
        company_id: CompanyId,
        id: MemberId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        let index = tables
            .members
            .iter()
            .position(|m| m.id == id && m.company_id == company_id)
            .ok_or(RepositoryError::NotFound)?;
        if tables.member_is_referenced(id) {
            return Err(RepositoryError::Conflict(
                "member still has time entries or invites".to_owned(),
            ));
        }
        tables.members.remove(index);
        for member in &mut tables.members {
            if member.manager_id == Some(id) {
                member.manager_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for MemoryStore {
    async fn list_clients(&self, company_id: CompanyId) -> Result<Vec<Client>, RepositoryError> {
        let mut clients: Vec<Client> = self
            .tables()
            .clients
            .iter()
            .filter(|c| c.company_id == company_id)
            .cloned()
            .collect();
        clients.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(clients)
    }

    async fn get_client(
        &self,
        company_id: CompanyId,
        id: ClientId,
    ) -> Result<Option<Client>, RepositoryError> {
        Ok(self
            .tables()
            .clients
            .iter()
            .find(|c| c.id == id && c.company_id == company_id)
            .cloned())
    }

    async fn create_client(
        &self,
        company_id: CompanyId,
        client: ClientChanges,
    ) -> Result<Client, RepositoryError> {
        let mut tables = self.tables();
        let now = Utc::now();
        let created = Client {
            id: ClientId::new(tables.next_id()),
            company_id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            address: client.address,
            notes: client.notes,
            created_at: now,
            updated_at: now,
        };
        tables.clients.push(created.clone());
        Ok(created)
    }

    async fn update_client(
        &self,
        company_id: CompanyId,
        id: ClientId,
        client: ClientChanges,
    ) -> Result<Client, RepositoryError> {
        let mut tables = self.tables();
        let existing = tables
            .clients
            .iter_mut()
            .find(|c| c.id == id && c.company_id == company_id)
            .ok_or(RepositoryError::NotFound)?;
        existing.name = client.name;
        existing.email = client.email;
        existing.phone = client.phone;
        existing.address = client.address;
        existing.notes = client.notes;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_client(
        &self,
        company_id: CompanyId,
        id: ClientId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        let index = tables
            .clients
            .iter()
            .position(|c| c.id == id && c.company_id == company_id)
            .ok_or(RepositoryError::NotFound)?;
        if tables.projects.iter().any(|p| p.client_id == id) {
            return Err(RepositoryError::Conflict("client still has projects".to_owned()));
        }
        tables.clients.remove(index);
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn list_projects(&self, company_id: CompanyId) -> Result<Vec<Project>, RepositoryError> {
        let mut projects: Vec<Project> = self
            .tables()
            .projects
            .iter()
            .filter(|p| p.company_id == company_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(projects)
    }

    async fn get_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
    ) -> Result<Option<Project>, RepositoryError> {
        Ok(self
            .tables()
            .projects
            .iter()
            .find(|p| p.id == id && p.company_id == company_id)
            .cloned())
    }

    async fn create_project(
        &self,
        company_id: CompanyId,
        project: ProjectChanges,
    ) -> Result<Project, RepositoryError> {
        let mut tables = self.tables();
        if !tables.clients.iter().any(|c| c.id == project.client_id) {
            return Err(RepositoryError::Conflict("client does not exist".to_owned()));
        }
        let now = Utc::now();
        let created = Project {
            id: ProjectId::new(tables.next_id()),
            company_id,
            client_id: project.client_id,
            name: project.name,
            description: project.description,
            status: project.status,
            start_date: project.start_date,
            end_date: project.end_date,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(created.clone());
        Ok(created)
    }

    async fn update_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
        project: ProjectChanges,
    ) -> Result<Project, RepositoryError> {
        let mut tables = self.tables();
        if !tables.clients.iter().any(|c| c.id == project.client_id) {
            return Err(RepositoryError::Conflict("client does not exist".to_owned()));
        }
        let existing = tables
            .projects
            .iter_mut()
            .find(|p| p.id == id && p.company_id == company_id)
            .ok_or(RepositoryError::NotFound)?;
        existing.client_id = project.client_id;
        existing.name = project.name;
        existing.description = project.description;
        existing.status = project.status;
        existing.start_date = project.start_date;
        existing.end_date = project.end_date;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_project(
        &self,
        company_id: CompanyId,
        id: ProjectId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables();
        let index = tables
            .projects
            .iter()
            .position(|p| p.id == id && p.company_id == company_id)
            .ok_or(RepositoryError::NotFound)?;
        if tables.time_entries.iter().any(|e| e.project_id == id) {
            return Err(RepositoryError::Conflict(
                "project still has time entries".to_owned(),
            ));
        }
        tables.projects.remove(index);
        Ok(())
    }
}

#[async_trait]
impl InviteRepository for MemoryStore {
    async fn create_invite(&self, invite: NewInvite) -> Result<Invite, RepositoryError> {
        let mut tables = self.tables();
        if tables.invites.iter().any(|i| i.token == invite.token) {
            return Err(RepositoryError::Conflict("invite token already exists".to_owned()));
        }
        let created = Invite {
            id: InviteId::new(tables.next_id()),
            company_id: invite.company_id,
            email: invite.email,
            role: invite.role,
            token: invite.token,
            status: InviteStatus::Pending,
            invited_by: invite.invited_by,
            created_at: Utc::now(),
            expires_at: invite.expires_at,
            accepted_at: None,
        };
        tables.invites.push(created.clone());
        Ok(created)
    }

    async fn find_invite_by_token(&self, token: &str) -> Result<Option<Invite>, RepositoryError> {
        Ok(self
            .tables()
            .invites
            .iter()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn list_pending_invites(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<Invite>, RepositoryError> {
        let mut invites: Vec<Invite> = self
            .tables()
            .invites
            .iter()
            .filter(|i| i.company_id == company_id && i.status == InviteStatus::Pending)
            .cloned()
            .collect();
        invites.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(invites)
    }

    async fn revoke_invite(
        &self,
        company_id: CompanyId,
        id: InviteId,
    ) -> Result<Invite, RepositoryError> {
        let mut tables = self.tables();
        let invite = tables
            .invites
            .iter_mut()
            .find(|i| i.id == id && i.company_id == company_id)
            .ok_or(RepositoryError::NotFound)?;
        if invite.status != InviteStatus::Pending {
            return Err(RepositoryError::Conflict("invite is no longer pending".to_owned()));
        }
        invite.status = InviteStatus::Revoked;
        Ok(invite.clone())
    }

    async fn accept_invite(
        &self,
        id: InviteId,
        member: NewMember,
        accepted_at: DateTime<Utc>,
    ) -> Result<Member, RepositoryError> {
        let mut tables = self.tables();
        let index = tables
            .invites
            .iter()
            .position(|i| i.id == id && i.status == InviteStatus::Pending)
            .ok_or_else(|| RepositoryError::Conflict("invite is no longer pending".to_owned()))?;

        // Insert first so a duplicate member leaves the invite untouched.
        let created = tables.insert_member(member)?;
        if let Some(invite) = tables.invites.get_mut(index) {
            invite.status = InviteStatus::Accepted;
            invite.accepted_at = Some(accepted_at);
        }
        Ok(created)
    }
}

#[async_trait]
impl TimeEntryRepository for MemoryStore {
    async fn insert_time_entries(
        &self,
        company_id: CompanyId,
        member_id: MemberId,
        drafts: &[TimeEntryDraft],
    ) -> Result<Vec<TimeEntry>, RepositoryError> {
        let mut tables = self.tables();
        if drafts
            .iter()
            .any(|d| !tables.projects.iter().any(|p| p.id == d.project_id))
        {
            return Err(RepositoryError::Conflict("project does not exist".to_owned()));
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let entry = TimeEntry {
                id: TimeEntryId::new(tables.next_id()),
                company_id,
                member_id,
                project_id: draft.project_id,
                date: draft.date,
                duration: draft.duration,
                description: draft.description.clone(),
                status: TimeEntryStatus::Draft,
                created_by: member_id,
                updated_by: member_id,
                approved_by: None,
                approved_at: None,
                rejection_reason: None,
                created_at: now,
                updated_at: now,
            };
            tables.time_entries.push(entry.clone());
            created.push(entry);
        }
        Ok(created)
    }

    async fn list_time_entries(
        &self,
        filter: TimeEntryFilter,
    ) -> Result<Vec<TimeEntry>, RepositoryError> {
        let mut entries: Vec<TimeEntry> = self
            .tables()
            .time_entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.date, e.id));
        Ok(entries)
    }

    async fn get_time_entry(
        &self,
        company_id: CompanyId,
        id: TimeEntryId,
    ) -> Result<Option<TimeEntry>, RepositoryError> {
        Ok(self
            .tables()
            .time_entries
            .iter()
            .find(|e| e.id == id && e.company_id == company_id)
            .cloned())
    }

    async fn transition_time_entry(
        &self,
        change: StatusChange,
    ) -> Result<TimeEntry, RepositoryError> {
        let mut tables = self.tables();
        let entry = tables
            .time_entries
            .iter_mut()
            .find(|e| e.id == change.id && e.status == change.from)
            .ok_or_else(|| {
                RepositoryError::Conflict(format!("time entry is no longer {}", change.from))
            })?;
        change.apply(entry);
        Ok(entry.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};
    use tally_core::{Email, EntryDuration};

    use super::*;

    fn profile(subject: &str, email: &str) -> MemberProfile {
        MemberProfile {
            subject: SubjectId::parse(subject).unwrap(),
            email: Email::parse(email).unwrap(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
        }
    }

    fn company(name: &str) -> NewCompany {
        NewCompany {
            name: name.to_owned(),
            ..NewCompany::default()
        }
    }

    async fn seed() -> (MemoryStore, Company, Member, Project) {
        let store = MemoryStore::new();
        let (company, admin) = store
            .create_company_with_admin(company("Acme"), profile("sub-admin", "admin@acme.test"))
            .await
            .unwrap();
        let client = store
            .create_client(
                company.id,
                ClientChanges {
                    name: "Globex".to_owned(),
                    ..ClientChanges::default()
                },
            )
            .await
            .unwrap();
        let project = store
            .create_project(
                company.id,
                ProjectChanges {
                    client_id: client.id,
                    name: "Website".to_owned(),
                    description: None,
                    status: tally_core::ProjectStatus::Active,
                    start_date: None,
                    end_date: None,
                },
            )
            .await
            .unwrap();
        (store, company, admin, project)
    }

    fn draft(project: ProjectId, day: u32) -> TimeEntryDraft {
        TimeEntryDraft {
            project_id: project,
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            duration: EntryDuration::from_minutes(90).unwrap(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_founder_becomes_admin() {
        let (store, company, admin, _) = seed().await;
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.company_id, company.id);
        let found = store
            .find_member_by_subject(&admin.subject)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, admin);
    }

    #[tokio::test]
    async fn test_duplicate_subject_conflicts() {
        let (store, _, _, _) = seed().await;
        let err = store
            .create_company_with_admin(company("Other"), profile("sub-admin", "x@other.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_entries_are_listed_in_date_order_without_dedupe() {
        let (store, company, admin, project) = seed().await;
        store
            .insert_time_entries(company.id, admin.id, &[draft(project.id, 15), draft(project.id, 13)])
            .await
            .unwrap();
        store
            .insert_time_entries(company.id, admin.id, &[draft(project.id, 13)])
            .await
            .unwrap();

        let entries = store
            .list_time_entries(TimeEntryFilter {
                company_id: company.id,
                member_id: None,
                from: None,
                to: None,
            })
            .await
            .unwrap();
        let days: Vec<u32> = entries.iter().map(|e| chrono::Datelike::day(&e.date)).collect();
        assert_eq!(days, vec![13, 13, 15]);
    }

    #[tokio::test]
    async fn test_stale_transition_conflicts() {
        let (store, company, admin, project) = seed().await;
        let entry = store
            .insert_time_entries(company.id, admin.id, &[draft(project.id, 13)])
            .await
            .unwrap()
            .remove(0);
        let change = StatusChange {
            id: entry.id,
            from: TimeEntryStatus::Draft,
            to: TimeEntryStatus::Submitted,
            actor: admin.id,
            at: Utc::now(),
            rejection_reason: None,
        };
        store.transition_time_entry(change.clone()).await.unwrap();
        let err = store.transition_time_entry(change).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_referenced_rows_cannot_be_deleted() {
        let (store, company, admin, project) = seed().await;
        store
            .insert_time_entries(company.id, admin.id, &[draft(project.id, 13)])
            .await
            .unwrap();
        assert!(matches!(
            store.delete_project(company.id, project.id).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            store.delete_client(company.id, project.client_id).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            store.delete_member(company.id, admin.id).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_demotion_clears_reports() {
        let (store, company, _, _) = seed().await;
        let manager = store
            .create_member(profile("sub-mgr", "mgr@acme.test").join(company.id, Role::Manager))
            .await
            .unwrap();
        let mut report = profile("sub-emp", "emp@acme.test").join(company.id, Role::Employee);
        report.manager_id = Some(manager.id);
        let report = store.create_member(report).await.unwrap();

        // A manager-level change keeps the team intact.
        store
            .update_member(company.id, manager.id, MemberChanges {
                first_name: Some("Grace".to_owned()),
                ..MemberChanges::default()
            })
            .await
            .unwrap();
        let kept = store.get_member(company.id, report.id).await.unwrap().unwrap();
        assert_eq!(kept.manager_id, Some(manager.id));

        let demoted = store
            .update_member(company.id, manager.id, MemberChanges {
                role: Some(Role::Employee),
                ..MemberChanges::default()
            })
            .await
            .unwrap();
        assert_eq!(demoted.role, Role::Employee);
        let released = store.get_member(company.id, report.id).await.unwrap().unwrap();
        assert_eq!(released.manager_id, None);
    }

    #[tokio::test]
    async fn test_accept_invite_once() {
        let (store, company, admin, _) = seed().await;
        let invite = store
            .create_invite(NewInvite {
                company_id: company.id,
                email: Email::parse("new@acme.test").unwrap(),
                role: Role::Employee,
                token: "tok".to_owned(),
                invited_by: admin.id,
                expires_at: Utc::now() + TimeDelta::days(7),
            })
            .await
            .unwrap();

        let member = profile("sub-new", "new@acme.test").join(company.id, Role::Employee);
        store
            .accept_invite(invite.id, member.clone(), Utc::now())
            .await
            .unwrap();
        let again = store.accept_invite(invite.id, member, Utc::now()).await;
        assert!(matches!(again, Err(RepositoryError::Conflict(_))));

        let stored = store.find_invite_by_token("tok").await.unwrap().unwrap();
        assert_eq!(stored.status, InviteStatus::Accepted);
        assert!(store.list_pending_invites(company.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scoped_lookups_hide_other_companies() {
        let (store, _, _, project) = seed().await;
        let (other, _) = store
            .create_company_with_admin(company("Other"), profile("sub-other", "o@other.test"))
            .await
            .unwrap();
        assert!(store.get_project(other.id, project.id).await.unwrap().is_none());
        assert!(store.list_projects(other.id).await.unwrap().is_empty());
    }
}
