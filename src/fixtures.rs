//! Instance texts shared by unit tests.

/// Two vehicles, three customers (declared out of order), two stations.
pub const SAMPLE: &str = "\
Vehicles 2
Customers 3
Stations 2
MaxTimeLag 40
k1 10 5
k0 15 5
c10 8 0 200
c0 20 10 150
c2 15 50 90
s1
s0
Locations
v0 50 50
v1 50 50
s0 40 40
s1 60 60
c0 30 50
c2 50 70
c10 60 40
---------------
seed 42
clusters 1
";

/// One vehicle of capacity 15 and one customer of demand 20: two split visits.
pub const SPLIT: &str = "\
MaxTimeLag 50
k0 15 5
c0 20 0 100
s0
Locations
v0 0 0
v1 0 0
s0 3 0
c0 6 4
";

/// The customer window closes before any vehicle can get there.
pub const UNREACHABLE: &str = "\
MaxTimeLag 50
k0 15 5
k1 20 5
c0 10 0 100
c1 10 0 20
s0
Locations
v0 0 0
v1 0 0
s0 3 0
c0 6 4
c1 100 100
";
