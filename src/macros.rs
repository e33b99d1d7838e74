macro_rules! tls_enum_u8 {
    ($name:ident => { $( $case:ident ( $val:expr ) ),* , (255) }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[allow(non_camel_case_types)]
        pub enum $name {
            $(
                $case,
            )*
            unknown(u8)
        }

        impl $name {
            pub fn to_u8(&self) -> u8 {
                match self {
                    $(
                        $name::$case => $val,
                    )*
                    $name::unknown(v) => *v
                }
            }

            pub fn from_u8(v: u8) -> Self {
                $(
                    if v == $val {
                        return $name::$case;
                    }
                )*
                $name::unknown(v)
            }

            pub fn parse(r: &mut $crate::parsing::Reader) -> $crate::error::Result<Self> {
                Ok(Self::from_u8(r.next_u8()?))
            }

            pub fn serialize(&self, out: &mut Vec<u8>) {
                out.push(self.to_u8());
            }
        }
    };
}

macro_rules! tls_enum_u16 {
    ($name:ident => { $( $case:ident ( $val:expr ) ),* , (65535) }) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[allow(non_camel_case_types)]
        pub enum $name {
            $(
                $case,
            )*
            unknown(u16)
        }

        impl $name {
            pub fn to_u16(&self) -> u16 {
                match self {
                    $(
                        $name::$case => $val,
                    )*
                    $name::unknown(v) => *v
                }
            }

            pub fn from_u16(v: u16) -> Self {
                $(
                    if v == $val {
                        return $name::$case;
                    }
                )*
                $name::unknown(v)
            }

            pub fn parse(r: &mut $crate::parsing::Reader) -> $crate::error::Result<Self> {
                Ok(Self::from_u16(r.next_u16()?))
            }

            pub fn serialize(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_u16().to_be_bytes());
            }
        }
    };
}
