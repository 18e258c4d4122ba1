//! Command modules for CLI

pub mod member;
pub mod namespace;
pub mod owner;
pub mod query;
pub mod user;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
#[command(about = "nsadmin commands")]
pub enum Commands {
    /// Reserve a new namespace prefix
    #[command(about = "Reserve a new namespace prefix")]
    AddNamespace(namespace::AddNamespaceArgs),

    /// Delete a reserved namespace
    #[command(about = "Delete a reserved namespace and re-evaluate verified packages")]
    DeleteNamespace(namespace::DeleteNamespaceArgs),

    /// List reserved namespaces
    #[command(about = "List reserved namespaces and their owners")]
    List(namespace::ListArgs),

    /// Add an owner to a namespace
    #[command(about = "Add an owner to a reserved namespace")]
    AddOwner(owner::AddOwnerArgs),

    /// Remove one or more owners from a namespace
    #[command(about = "Remove owners from a reserved namespace")]
    RemoveOwner(owner::RemoveOwnerArgs),

    /// Curate a package registration into a namespace
    #[command(about = "Add a package registration to a namespace")]
    AddMember(member::MemberArgs),

    /// Remove a curated package registration from a namespace
    #[command(about = "Remove a package registration from a namespace")]
    RemoveMember(member::MemberArgs),

    /// Show the namespaces that govern a package id
    #[command(about = "Show reserved namespaces matching a package id")]
    Matching(query::MatchingArgs),

    /// Check whether a user may push a package id
    #[command(about = "Check whether a user may push a package id")]
    Check(query::CheckArgs),

    /// Add or replace a user account in the snapshot file
    #[command(about = "Add or replace a user account")]
    AddUser(user::AddUserArgs),
}
