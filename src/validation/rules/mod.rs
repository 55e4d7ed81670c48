pub(crate) mod demand;
pub(crate) mod references;
