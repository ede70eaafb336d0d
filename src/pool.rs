pub(crate) mod opts;
pub(crate) mod report;
pub(crate) mod run;
pub(crate) mod worker;
