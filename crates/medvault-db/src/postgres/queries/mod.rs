mod admins;
mod documents;
